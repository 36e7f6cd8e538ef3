//! The `urlinclude` configuration directive.

use super::{Directive, DirectiveInvocation, DirectiveSpec, Node};
use crate::build::DocContext;
use crate::reference::{BRANCH_OPTION, GITHUB_OPTION, Override};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Registers the document's reference override and renders nothing.
///
/// ```text
/// .. urlinclude::
///    :github: org/repo
///    :branch: main
/// ```
///
/// Each invocation with options replaces the stored override wholesale; an
/// invocation without options leaves it untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlIncludeConfig;

#[async_trait]
impl Directive for UrlIncludeConfig {
    fn name(&self) -> &str {
        "urlinclude"
    }

    fn spec(&self) -> DirectiveSpec {
        DirectiveSpec::new(0, 0).with_options(&[BRANCH_OPTION, GITHUB_OPTION])
    }

    async fn run(&self, invocation: DirectiveInvocation, ctx: &DocContext<'_>) -> Result<Vec<Node>> {
        let value = Override::from_options(&invocation.options);
        if !value.is_empty() {
            debug!("Document '{}' references {:?}", ctx.docname, value);
            ctx.set_override(value);
        }
        Ok(Vec::new())
    }
}

//! The seam between the runtime and output formats.

use crate::reconciled::Reconciled;

/// Turns a reconciled tree into some output representation.
pub trait Renderer {
    type Output;

    fn render(&self, node: &Reconciled) -> Self::Output;
}

/// Hands the tree back unchanged; useful for tests and in-process mirrors.
pub struct IdentityRenderer;

impl Renderer for IdentityRenderer {
    type Output = Reconciled;

    fn render(&self, node: &Reconciled) -> Reconciled {
        node.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciled::ReconciledText;

    #[test]
    fn identity_renderer_returns_the_tree_unchanged() {
        let tree = Reconciled::Text(ReconciledText { text: "x".into() });
        assert_eq!(IdentityRenderer.render(&tree), tree);
    }
}

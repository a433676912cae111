use super::operators::prec;
use super::scope::FrameKind;
use super::{Printer, statement_list};
use crate::error::Result;
use r2js_ast::{Node, NodeKind};
use r2js_common::EsLevel;
use tracing::trace;

impl<'a> Printer<'a> {
    // =========================================================================
    // Statement sequences in expression position
    // =========================================================================

    /// `(a; b)` → `(a, b)`; sequences holding statements become an IIFE.
    pub(super) fn emit_group(&mut self, node: &Node) -> Result<u8> {
        let statements = statement_list(Some(node));
        match statements.as_slice() {
            [] => {
                self.write("null");
                Ok(prec::PRIMARY)
            }
            [single] => self.emit_expr(single, prec::LOWEST),
            many if many.iter().any(|statement| self.is_statement_only(statement)) => {
                self.emit_iife(node)
            }
            many => {
                for (index, expression) in many.iter().enumerate() {
                    if index > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(expression, prec::ASSIGN)?;
                }
                Ok(prec::COMMA)
            }
        }
    }

    /// Kinds with no expression form of their own.
    pub(super) fn is_statement_only(&self, node: &Node) -> bool {
        match node.kind() {
            NodeKind::Case
            | NodeKind::While
            | NodeKind::Until
            | NodeKind::WhilePost
            | NodeKind::UntilPost
            | NodeKind::For
            | NodeKind::Rescue
            | NodeKind::Ensure
            | NodeKind::Throw
            | NodeKind::Return
            | NodeKind::Break
            | NodeKind::Next
            | NodeKind::Class
            | NodeKind::Module
            | NodeKind::Import
            | NodeKind::Export => true,
            NodeKind::Begin | NodeKind::Kwbegin => {
                let statements = statement_list(Some(node));
                statements.len() > 1 || statements.iter().any(|inner| self.is_statement_only(inner))
            }
            NodeKind::If => node
                .child_nodes()
                .skip(1)
                .any(|branch| self.is_statement_only(branch)),
            _ => false,
        }
    }

    /// Run statements for their value: `(() => {...})()`.
    pub(super) fn emit_iife(&mut self, node: &Node) -> Result<u8> {
        let arrow = self.es(EsLevel::ES2015);
        trace!(kind = %node.kind(), arrow, "wrapping statements in a function call");
        self.write(if arrow { "(() => " } else { "(function() " });
        let body = self.tail_return(node);
        self.push_frame(FrameKind::Closure, arrow);
        let result = self.emit_function_body(Some(&body), None);
        self.finish_frame();
        result?;
        self.write(")()");
        Ok(prec::CALL)
    }
}

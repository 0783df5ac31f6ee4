//! Reference documentation rendering for schemas.
//!
//! A read-only walk over the schema tree renders every parameter with
//! its comment, presence, and default, nested structure in declaration
//! order. Defaulted sequences and tuples print on one line with their
//! default; their synthetic elements are folded into it.

use crate::types::param::{Parameter, Presence};
use crate::types::walk::{walk, Visitor};

pub(crate) fn render_reference(
    root: &dyn Parameter,
    out: &mut dyn std::fmt::Write,
    indent: usize,
) -> std::fmt::Result {
    let mut printer = ReferencePrinter {
        buf: String::new(),
        step: indent.max(1),
        depth: 0,
        folded: 0,
    };
    walk(root, &mut printer);
    out.write_str(&printer.buf)
}

struct ReferencePrinter {
    buf: String,
    step: usize,
    depth: usize,
    /// Nesting count inside a one-line defaulted sequence or tuple.
    folded: usize,
}

impl ReferencePrinter {
    fn pad(&self) -> String {
        " ".repeat(self.depth * self.step)
    }

    fn emit_comment(&mut self, parameter: &dyn Parameter) {
        if parameter.comment().is_empty() {
            return;
        }
        let pad = self.pad();
        let mut lines = String::new();
        for line in parameter.comment().lines() {
            lines.push_str(&format!("{pad}# {line}\n"));
        }
        self.buf.push_str(&lines);
    }

    fn open_structured(&mut self, parameter: &dyn Parameter, bracket: char) {
        if self.folded > 0 {
            self.folded += 1;
            return;
        }
        self.emit_comment(parameter);
        if let Some(default) = parameter.default_display() {
            self.buf
                .push_str(&format!("{}{}: {default}\n", self.pad(), parameter.name()));
            self.folded = 1;
            return;
        }
        let suffix = if parameter.is_optional() {
            "  # optional"
        } else {
            ""
        };
        self.buf.push_str(&format!(
            "{}{}: {bracket}{suffix}\n",
            self.pad(),
            parameter.name()
        ));
        self.depth += 1;
    }

    fn close_structured(&mut self, bracket: char) {
        if self.folded > 0 {
            self.folded -= 1;
            return;
        }
        self.depth -= 1;
        self.buf.push_str(&format!("{}{bracket}\n", self.pad()));
    }
}

impl Visitor for ReferencePrinter {
    fn atom(&mut self, parameter: &dyn Parameter) {
        if self.folded > 0 {
            return;
        }
        self.emit_comment(parameter);
        let marker = match parameter.presence() {
            Presence::Required | Presence::RequiredConditional => "<required>".to_string(),
            Presence::Optional => "<optional>".to_string(),
            Presence::Default => parameter
                .default_display()
                .unwrap_or_else(|| "<default>".to_string()),
        };
        self.buf
            .push_str(&format!("{}{}: {marker}\n", self.pad(), parameter.name()));
    }

    fn enter_table(&mut self, parameter: &dyn Parameter) {
        self.open_structured(parameter, '{');
    }

    fn exit_table(&mut self, _parameter: &dyn Parameter) {
        self.close_structured('}');
    }

    fn enter_sequence(&mut self, parameter: &dyn Parameter) {
        self.open_structured(parameter, '[');
    }

    fn exit_sequence(&mut self, _parameter: &dyn Parameter) {
        self.close_structured(']');
    }

    fn enter_tuple(&mut self, parameter: &dyn Parameter) {
        self.open_structured(parameter, '[');
    }

    fn exit_tuple(&mut self, _parameter: &dyn Parameter) {
        self.close_structured(']');
    }
}

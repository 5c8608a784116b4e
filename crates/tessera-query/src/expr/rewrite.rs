//! Pure expression rewrites and property deduction.

use std::collections::{BTreeMap, BTreeSet};

use super::Expr;

/// What a pattern label attribute is bound to after rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    /// The vertex of the current row.
    Vertex,
    /// The edge of the current row.
    Edge,
}

impl LabelTarget {
    const fn expr(self) -> Expr {
        match self {
            Self::Vertex => Expr::Vertex,
            Self::Edge => Expr::Edge,
        }
    }
}

/// Properties and bindings an expression refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropRefs {
    /// Tag properties, keyed by tag name.
    pub tag_props: BTreeMap<String, BTreeSet<String>>,
    /// Pattern label attributes, keyed by alias.
    pub label_attrs: BTreeMap<String, BTreeSet<String>>,
    /// Input columns.
    pub input_props: BTreeSet<String>,
    /// Variables.
    pub variables: BTreeSet<String>,
    /// Whether the current vertex is used.
    pub uses_vertex: bool,
    /// Whether the current edge is used.
    pub uses_edge: bool,
}

impl PropRefs {
    /// Merges another set of references into this one.
    pub fn merge(&mut self, other: Self) {
        for (tag, props) in other.tag_props {
            self.tag_props.entry(tag).or_default().extend(props);
        }
        for (label, attrs) in other.label_attrs {
            self.label_attrs.entry(label).or_default().extend(attrs);
        }
        self.input_props.extend(other.input_props);
        self.variables.extend(other.variables);
        self.uses_vertex |= other.uses_vertex;
        self.uses_edge |= other.uses_edge;
    }
}

fn boxed<F: FnMut(Expr) -> Expr>(e: Box<Expr>, f: &mut F) -> Box<Expr> {
    Box::new(e.transform(f))
}

impl Expr {
    /// Direct children in evaluation order.
    #[must_use]
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Self::Attribute { base, .. } | Self::Not(base) | Self::IsNull(base) => vec![base],
            Self::Relational { left, right, .. }
            | Self::Logical { left, right, .. }
            | Self::Arithmetic { left, right, .. } => vec![left, right],
            Self::Subscript { base, index } => vec![base, index],
            Self::FunctionCall { args: items, .. } | Self::List(items) | Self::PathBuild(items) => {
                items.iter().collect()
            }
            Self::Constant(_)
            | Self::InputProperty(_)
            | Self::Variable(_)
            | Self::Vertex
            | Self::Edge
            | Self::TagProperty { .. }
            | Self::LabelAttribute { .. }
            | Self::Iteration => Vec::new(),
        }
    }

    /// Visits every node of the tree in pre-order.
    pub fn visit<F: FnMut(&Expr)>(&self, f: &mut F) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            f(expr);
            stack.extend(expr.children().into_iter().rev());
        }
    }

    /// Returns `true` if any node satisfies the predicate.
    #[must_use]
    pub fn any<F: Fn(&Expr) -> bool>(&self, pred: F) -> bool {
        let mut found = false;
        self.visit(&mut |e| found |= pred(e));
        found
    }

    /// Rebuilds the tree bottom-up, applying `f` to every rebuilt node.
    #[must_use]
    pub fn transform<F: FnMut(Expr) -> Expr>(self, f: &mut F) -> Expr {
        let rebuilt = match self {
            Self::Attribute { base, attr } => Self::Attribute { base: boxed(base, f), attr },
            Self::Relational { op, left, right } => {
                let left = boxed(left, f);
                Self::Relational { op, left, right: boxed(right, f) }
            }
            Self::Logical { op, left, right } => {
                let left = boxed(left, f);
                Self::Logical { op, left, right: boxed(right, f) }
            }
            Self::Arithmetic { op, left, right } => {
                let left = boxed(left, f);
                Self::Arithmetic { op, left, right: boxed(right, f) }
            }
            Self::Not(inner) => Self::Not(boxed(inner, f)),
            Self::IsNull(inner) => Self::IsNull(boxed(inner, f)),
            Self::FunctionCall { func, args } => {
                let args = args.into_iter().map(|a| a.transform(f)).collect();
                Self::FunctionCall { func, args }
            }
            Self::Subscript { base, index } => {
                let base = boxed(base, f);
                Self::Subscript { base, index: boxed(index, f) }
            }
            Self::List(items) => Self::List(items.into_iter().map(|e| e.transform(f)).collect()),
            Self::PathBuild(items) => {
                Self::PathBuild(items.into_iter().map(|e| e.transform(f)).collect())
            }
            leaf => leaf,
        };
        f(rebuilt)
    }

    /// Binds every pattern label attribute to the current vertex or edge.
    ///
    /// `v.name` becomes `VERTEX.name` (or `EDGE.name`), leaving `self`
    /// untouched.
    #[must_use]
    pub fn rewrite_labels(&self, target: LabelTarget) -> Expr {
        self.clone().transform(&mut |e| match e {
            Self::LabelAttribute { attr, .. } => {
                Self::Attribute { base: Box::new(target.expr()), attr }
            }
            other => other,
        })
    }

    /// Collects the properties and bindings this expression refers to.
    #[must_use]
    pub fn referenced_props(&self) -> PropRefs {
        let mut refs = PropRefs::default();
        self.visit(&mut |e| match e {
            Self::TagProperty { tag, prop } => {
                refs.tag_props.entry(tag.clone()).or_default().insert(prop.clone());
            }
            Self::LabelAttribute { label, attr } => {
                refs.label_attrs.entry(label.clone()).or_default().insert(attr.clone());
            }
            Self::InputProperty(name) => {
                refs.input_props.insert(name.clone());
            }
            Self::Variable(name) => {
                refs.variables.insert(name.clone());
            }
            Self::Vertex => refs.uses_vertex = true,
            Self::Edge => refs.uses_edge = true,
            _ => {}
        });
        refs
    }
}

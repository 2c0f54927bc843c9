use crate::error::StandoffError;
use crate::name::Name;
use crate::xml::XML_NAMESPACE;

/// A stack-based visibility gate deciding whether content is copied to the
/// output text at all. Once inside an excluded subtree, only an explicit
/// re-inclusion can restore visibility; inside an included context, exclusions
/// are evaluated per node. With an empty stack everything is visible.
#[derive(Debug, Default)]
pub struct InclusionContext {
    stack: Vec<bool>,
}

impl InclusionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Enter a context-defining unit. `include` and `exclude` are the
    /// predicates evaluated for this node.
    pub fn enter(&mut self, include: bool, exclude: bool) {
        let included = if self.included() { !exclude } else { include };
        self.stack.push(included);
    }

    /// Leave the unit (guarded against an empty stack)
    pub fn leave(&mut self) {
        self.stack.pop();
    }

    /// Current visibility
    pub fn included(&self) -> bool {
        self.stack.last().copied().unwrap_or(true)
    }
}

/// Scoped XML namespace bindings, collected from `xmlns`/`xmlns:prefix`
/// declarations while the element stack grows and shrinks. The streaming parser
/// reports qualified names only; this resolves them to [`Name`]s.
#[derive(Debug, Default)]
pub struct NamespaceContext {
    /// One scope per open element: the declarations that element introduced.
    /// `None` as prefix is the default namespace.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.scopes.clear();
    }

    /// Push the declarations introduced by the element just opened (possibly none)
    pub fn push_scope(&mut self, declarations: Vec<(Option<String>, String)>) {
        self.scopes.push(declarations);
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        for scope in self.scopes.iter().rev() {
            for (declared, uri) in scope.iter().rev() {
                if declared.as_deref() == Some(prefix) {
                    return Some(uri);
                }
            }
        }
        None
    }

    fn default_namespace(&self) -> Option<&str> {
        for scope in self.scopes.iter().rev() {
            for (declared, uri) in scope.iter().rev() {
                if declared.is_none() {
                    // xmlns="" unbinds the default namespace
                    return if uri.is_empty() { None } else { Some(uri) };
                }
            }
        }
        None
    }

    /// Resolve an element's qualified name. Unprefixed element names fall under
    /// the default namespace.
    pub fn resolve_element(&self, qname: &str) -> Result<Name, StandoffError> {
        if let Some((prefix, local)) = qname.split_once(':') {
            match self.lookup(prefix) {
                Some(uri) => Ok(Name::new(Some(uri), local)),
                None => Err(StandoffError::UnknownPrefix(
                    prefix.to_string(),
                    "resolving element name",
                )),
            }
        } else {
            Ok(Name::new(self.default_namespace(), qname))
        }
    }

    /// Resolve an attribute's qualified name. Unprefixed attribute names carry
    /// no namespace (the default namespace does not apply to attributes).
    pub fn resolve_attribute(&self, qname: &str) -> Result<Name, StandoffError> {
        if let Some((prefix, local)) = qname.split_once(':') {
            match self.lookup(prefix) {
                Some(uri) => Ok(Name::new(Some(uri), local)),
                None => Err(StandoffError::UnknownPrefix(
                    prefix.to_string(),
                    "resolving attribute name",
                )),
            }
        } else {
            Ok(Name::local(qname))
        }
    }
}

//! Class Registry & Loader (C3) and the Type Checker Utility's
//! assignment-compatibility and overload-match rules (C2), which both need
//! the registry to walk superclass chains.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{ErrorKind, InterpError, InterpResult};
use crate::literal::parse_literal_token;
use crate::token::Node;
use crate::value::{TypeDesc, Value};

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub ty: TypeDesc,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub ret: TypeDesc,
    pub params: Vec<ParamDecl>,
    pub body: Node,
}

/// How a field's current value was produced, kept distinct from the
/// already-computed `Value` so generic specialization can re-validate a
/// literal against the concrete substituted type (spec §4.4).
#[derive(Debug, Clone)]
pub enum FieldInit {
    Default,
    Literal(Value),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDesc,
    pub init: FieldInit,
}

impl FieldDecl {
    #[must_use]
    pub fn initial_value(&self) -> Value {
        match &self.init {
            FieldInit::Default => self.ty.default_value(),
            FieldInit::Literal(v) => v.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<String>,
    pub template_params: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: IndexMap<String, Vec<MethodDecl>>,
}

impl ClassDef {
    #[must_use]
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

pub struct ClassRegistry {
    classes: IndexMap<String, Rc<ClassDef>>,
    arities: IndexMap<String, usize>,
    specialized: RefCell<IndexMap<String, Rc<ClassDef>>>,
}

impl ClassRegistry {
    /// Loads a parsed program (spec §4.1): a discovery pass records every
    /// class name (so forward references resolve), then a definition pass
    /// builds each `ClassDef` in full.
    pub fn load(program: &[Node]) -> InterpResult<Self> {
        let mut arities = IndexMap::new();
        for form in program {
            let Some(items) = form.items() else {
                return Err(InterpError::syntax("top-level form must be a list"));
            };
            match items.first().and_then(Node::text) {
                Some("class") => {
                    let name = class_name(items, form.line())?;
                    if arities.insert(name.clone(), 0).is_some() {
                        return Err(InterpError::name(format!("duplicate class '{name}'")).at_line(form.line()));
                    }
                }
                Some("tclass") => {
                    let name = class_name(items, form.line())?;
                    let params = template_param_names(items, form.line())?;
                    if arities.insert(name.clone(), params.len()).is_some() {
                        return Err(InterpError::name(format!("duplicate class '{name}'")).at_line(form.line()));
                    }
                }
                _ => return Err(InterpError::syntax("expected 'class' or 'tclass' at top level").at_line(form.line())),
            }
        }

        let mut classes = IndexMap::new();
        for form in program {
            let items = form.items().expect("validated above");
            let def = match items[0].text() {
                Some("class") => build_class(items, &arities)?,
                Some("tclass") => build_tclass(items, &arities)?,
                _ => unreachable!("validated above"),
            };
            if let Some(super_name) = &def.superclass {
                match arities.get(super_name) {
                    Some(0) => {}
                    Some(_) => {
                        return Err(
                            InterpError::ty(format!("'{super_name}' is a template class and cannot be a superclass"))
                                .at_line(form.line()),
                        );
                    }
                    None => {
                        return Err(InterpError::ty(format!("unknown superclass '{super_name}'")).at_line(form.line()));
                    }
                }
            }
            classes.insert(def.name.clone(), Rc::new(def));
        }

        Ok(Self { classes, arities, specialized: RefCell::new(IndexMap::new()) })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<ClassDef>> {
        self.classes.get(name).cloned()
    }

    #[must_use]
    pub fn has_main(&self) -> bool {
        self.classes.get("main").is_some_and(|c| !c.is_template())
    }

    /// Parses a type descriptor from its surface spelling, using registered
    /// class arities to know how many `@`-segments a generic type consumes
    /// (a recursive-descent fix for the flat splitting the original
    /// source used, which can't disambiguate nested generics — see
    /// SPEC_FULL.md §F.4 / DESIGN.md).
    #[must_use]
    pub fn parse_type(&self, spelling: &str, local_tparams: &[String]) -> Option<TypeDesc> {
        let segs: Vec<&str> = spelling.split('@').collect();
        let (desc, consumed) = parse_type_segments(&segs, 0, &self.arities, local_tparams)?;
        (consumed == segs.len()).then_some(desc)
    }

    /// `sub` is `sup`, or transitively inherits from it. Specialized
    /// generic classes (names containing `@`) have no superclass, since
    /// `tclass` forms can't declare `inherits`.
    #[must_use]
    pub fn inherits(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        if sub.contains('@') {
            return false;
        }
        match self.classes.get(sub).and_then(|c| c.superclass.as_deref()) {
            Some(next) => self.inherits(next, sup),
            None => false,
        }
    }

    /// Resolves a class name to a concrete `ClassDef`, specializing a
    /// generic class on first use (spec §4.4). Non-generic lookups are a
    /// direct registry hit; specializations are cached by canonical name.
    pub fn resolve(&self, canonical_name: &str) -> InterpResult<Rc<ClassDef>> {
        if let Some(def) = self.classes.get(canonical_name) {
            if def.is_template() {
                return Err(InterpError::ty(format!("'{canonical_name}' is a template class and cannot be instantiated directly")));
            }
            return Ok(Rc::clone(def));
        }
        if let Some(cached) = self.specialized.borrow().get(canonical_name) {
            return Ok(Rc::clone(cached));
        }

        let ty = self
            .parse_type(canonical_name, &[])
            .ok_or_else(|| InterpError::ty(format!("unknown class '{canonical_name}'")))?;
        let TypeDesc::TClass(base, args) = ty else {
            return Err(InterpError::name(format!("unknown class '{canonical_name}'")));
        };
        let template = self
            .classes
            .get(&base)
            .ok_or_else(|| InterpError::name(format!("unknown class '{base}'")))?;
        if template.template_params.len() != args.len() {
            return Err(InterpError::ty(format!(
                "'{base}' expects {} template argument(s), got {}",
                template.template_params.len(),
                args.len()
            )));
        }

        let ty_subst: HashMap<&str, &TypeDesc> =
            template.template_params.iter().map(String::as_str).zip(args.iter()).collect();
        let text_subst: HashMap<String, String> = template
            .template_params
            .iter()
            .cloned()
            .zip(args.iter().map(TypeDesc::canonical_name))
            .collect();

        let mut fields = Vec::with_capacity(template.fields.len());
        for fd in &template.fields {
            let ty = substitute_type(&fd.ty, &ty_subst);
            let init = match &fd.init {
                FieldInit::Default => FieldInit::Default,
                FieldInit::Literal(v) => {
                    if !literal_compatible(&ty, v) {
                        return Err(InterpError::ty(format!(
                            "field '{}' initializer incompatible with '{ty}'",
                            fd.name
                        )));
                    }
                    FieldInit::Literal(v.clone())
                }
            };
            fields.push(FieldDecl { name: fd.name.clone(), ty, init });
        }

        let mut methods = IndexMap::new();
        for (name, overloads) in &template.methods {
            let specialized_overloads = overloads
                .iter()
                .map(|m| MethodDecl {
                    name: m.name.clone(),
                    ret: substitute_type(&m.ret, &ty_subst),
                    params: m
                        .params
                        .iter()
                        .map(|p| ParamDecl { ty: substitute_type(&p.ty, &ty_subst), name: p.name.clone() })
                        .collect(),
                    body: substitute_body(&m.body, &text_subst),
                })
                .collect();
            methods.insert(name.clone(), specialized_overloads);
        }

        let specialized = Rc::new(ClassDef {
            name: canonical_name.to_owned(),
            superclass: None,
            template_params: Vec::new(),
            fields,
            methods,
        });
        self.specialized.borrow_mut().insert(canonical_name.to_owned(), Rc::clone(&specialized));
        Ok(specialized)
    }
}

fn class_name(items: &[Node], line: Option<u32>) -> InterpResult<String> {
    items
        .get(1)
        .and_then(Node::text)
        .map(str::to_owned)
        .ok_or_else(|| InterpError::syntax("missing class name").at_line(line))
}

fn template_param_names(items: &[Node], line: Option<u32>) -> InterpResult<Vec<String>> {
    let list = items.get(2).ok_or_else(|| InterpError::syntax("missing template parameter list").at_line(line))?;
    let params = list.items().ok_or_else(|| InterpError::syntax("template parameter list must be a list").at_line(line))?;
    Ok(params.iter().filter_map(Node::text).map(str::to_owned).collect())
}

fn build_class(items: &[Node], arities: &IndexMap<String, usize>) -> InterpResult<ClassDef> {
    let line = items.first().and_then(Node::line);
    let name = class_name(items, line)?;
    let (superclass, body_start) = if items.get(2).and_then(Node::text) == Some("inherits") {
        let super_name = items
            .get(3)
            .and_then(Node::text)
            .ok_or_else(|| InterpError::syntax("missing superclass name").at_line(line))?
            .to_owned();
        (Some(super_name), 4)
    } else {
        (None, 2)
    };
    let (fields, methods) = build_body(&items[body_start..], &name, arities, &[])?;
    Ok(ClassDef { name, superclass, template_params: Vec::new(), fields, methods })
}

fn build_tclass(items: &[Node], arities: &IndexMap<String, usize>) -> InterpResult<ClassDef> {
    let line = items.first().and_then(Node::line);
    let name = class_name(items, line)?;
    let params = template_param_names(items, line)?;
    let (fields, methods) = build_body(&items[3..], &name, arities, &params)?;
    Ok(ClassDef { name, superclass: None, template_params: params, fields, methods })
}

fn build_body(
    body: &[Node],
    class_name: &str,
    arities: &IndexMap<String, usize>,
    tparams: &[String],
) -> InterpResult<(Vec<FieldDecl>, IndexMap<String, Vec<MethodDecl>>)> {
    let mut fields: Vec<FieldDecl> = Vec::new();
    let mut methods: IndexMap<String, Vec<MethodDecl>> = IndexMap::new();

    for chunk in body {
        let items = chunk.items().ok_or_else(|| InterpError::syntax("class body entry must be a list").at_line(chunk.line()))?;
        match items.first().and_then(Node::text) {
            Some("field") => {
                let fd = build_field(items, arities, tparams)?;
                if fields.iter().any(|f| f.name == fd.name) {
                    return Err(InterpError::name(format!("duplicate field '{}' in '{class_name}'", fd.name)).at_line(chunk.line()));
                }
                fields.push(fd);
            }
            Some("method") => {
                let md = build_method(items, arities, tparams)?;
                let overloads = methods.entry(md.name.clone()).or_default();
                if overloads.iter().any(|existing| same_signature(existing, &md)) {
                    return Err(InterpError::name(format!("duplicate method '{}' in '{class_name}'", md.name)).at_line(chunk.line()));
                }
                overloads.push(md);
            }
            _ => return Err(InterpError::syntax("expected 'field' or 'method'").at_line(chunk.line())),
        }
    }
    Ok((fields, methods))
}

fn same_signature(a: &MethodDecl, b: &MethodDecl) -> bool {
    a.params.len() == b.params.len() && a.params.iter().zip(&b.params).all(|(x, y)| x.ty == y.ty)
}

fn build_field(items: &[Node], arities: &IndexMap<String, usize>, tparams: &[String]) -> InterpResult<FieldDecl> {
    let line = items.first().and_then(Node::line);
    let type_text = items.get(1).and_then(Node::text).ok_or_else(|| InterpError::syntax("missing field type").at_line(line))?;
    let name = items
        .get(2)
        .and_then(Node::text)
        .ok_or_else(|| InterpError::syntax("missing field name").at_line(line))?
        .to_owned();
    let ty = parse_type_segments_owned(type_text, arities, tparams)
        .ok_or_else(|| InterpError::ty(format!("undeclared class '{type_text}'")).at_line(line))?;

    let init = match items.get(3) {
        None => FieldInit::Default,
        Some(init_node) => {
            let text = init_node.text().ok_or_else(|| InterpError::syntax("field initializer must be a literal").at_line(line))?;
            let value = parse_literal_token(text).ok_or_else(|| InterpError::ty(format!("invalid literal '{text}'")).at_line(line))?;
            if tparams.is_empty() && !literal_compatible(&ty, &value) {
                return Err(InterpError::ty(format!("incompatible type '{type_text}' with value '{text}'")).at_line(line));
            }
            FieldInit::Literal(value)
        }
    };
    Ok(FieldDecl { name, ty, init })
}

fn build_method(items: &[Node], arities: &IndexMap<String, usize>, tparams: &[String]) -> InterpResult<MethodDecl> {
    let line = items.first().and_then(Node::line);
    let ret_text = items.get(1).and_then(Node::text).ok_or_else(|| InterpError::syntax("missing return type").at_line(line))?;
    let name = items
        .get(2)
        .and_then(Node::text)
        .ok_or_else(|| InterpError::syntax("missing method name").at_line(line))?
        .to_owned();
    let params_node = items.get(3).ok_or_else(|| InterpError::syntax("missing parameter list").at_line(line))?;
    let body = items.get(4).ok_or_else(|| InterpError::syntax("missing method body").at_line(line))?.clone();

    let ret = parse_type_segments_owned(ret_text, arities, tparams)
        .ok_or_else(|| InterpError::ty(format!("invalid type '{ret_text}'")).at_line(line))?;

    let mut params = Vec::new();
    for param_node in params_node.items().ok_or_else(|| InterpError::syntax("parameter list must be a list").at_line(line))? {
        let pair = param_node.items().ok_or_else(|| InterpError::syntax("parameter must be (TYPE NAME)").at_line(line))?;
        let p_type = pair.first().and_then(Node::text).ok_or_else(|| InterpError::syntax("missing parameter type").at_line(line))?;
        let p_name = pair
            .get(1)
            .and_then(Node::text)
            .ok_or_else(|| InterpError::syntax("missing parameter name").at_line(line))?
            .to_owned();
        if params.iter().any(|p: &ParamDecl| p.name == p_name) {
            return Err(InterpError::name(format!("duplicate formal parameter '{p_name}'")).at_line(line));
        }
        let p_ty = parse_type_segments_owned(p_type, arities, tparams)
            .ok_or_else(|| InterpError::ty(format!("invalid type '{p_type}'")).at_line(line))?;
        params.push(ParamDecl { ty: p_ty, name: p_name });
    }

    Ok(MethodDecl { name, ret, params, body })
}

fn parse_type_segments_owned(spelling: &str, arities: &IndexMap<String, usize>, tparams: &[String]) -> Option<TypeDesc> {
    let segs: Vec<&str> = spelling.split('@').collect();
    let (desc, consumed) = parse_type_segments(&segs, 0, arities, tparams)?;
    (consumed == segs.len()).then_some(desc)
}

fn parse_type_segments(
    segs: &[&str],
    idx: usize,
    arities: &IndexMap<String, usize>,
    tparams: &[String],
) -> Option<(TypeDesc, usize)> {
    let seg = *segs.get(idx)?;
    match seg {
        "int" => Some((TypeDesc::Int, idx + 1)),
        "string" => Some((TypeDesc::String, idx + 1)),
        "bool" => Some((TypeDesc::Bool, idx + 1)),
        "void" => Some((TypeDesc::Void, idx + 1)),
        name => {
            if tparams.iter().any(|p| p == name) {
                return Some((TypeDesc::Class(name.to_owned()), idx + 1));
            }
            let arity = *arities.get(name)?;
            if arity == 0 {
                Some((TypeDesc::Class(name.to_owned()), idx + 1))
            } else {
                let mut args = Vec::with_capacity(arity);
                let mut cur = idx + 1;
                for _ in 0..arity {
                    let (arg, next) = parse_type_segments(segs, cur, arities, tparams)?;
                    args.push(arg);
                    cur = next;
                }
                Some((TypeDesc::TClass(name.to_owned(), args), cur))
            }
        }
    }
}

fn substitute_type(ty: &TypeDesc, subst: &HashMap<&str, &TypeDesc>) -> TypeDesc {
    match ty {
        TypeDesc::Class(name) => subst.get(name.as_str()).map(|t| (*t).clone()).unwrap_or_else(|| ty.clone()),
        TypeDesc::TClass(base, args) => {
            TypeDesc::TClass(base.clone(), args.iter().map(|a| substitute_type(a, subst)).collect())
        }
        _ => ty.clone(),
    }
}

/// Replaces every leaf token equal to a template parameter name with the
/// textual spelling of its concrete type argument (spec §4.4), enabling
/// uses like `(new T)` inside a templated method body.
fn substitute_body(node: &Node, subst: &HashMap<String, String>) -> Node {
    match node {
        Node::Leaf(tok) => match subst.get(&tok.text) {
            Some(replacement) => Node::Leaf(crate::token::Token { text: replacement.clone(), line: tok.line }),
            None => node.clone(),
        },
        Node::List(items) => Node::List(items.iter().map(|n| substitute_body(n, subst)).collect()),
    }
}

/// Whether a parsed literal `Value` (always primitive or `null`) is a valid
/// initializer for a field declared with type `ty`.
#[must_use]
pub fn literal_compatible(ty: &TypeDesc, value: &Value) -> bool {
    match ty {
        TypeDesc::Int => matches!(value, Value::Int(_)),
        TypeDesc::String => matches!(value, Value::Str(_)),
        TypeDesc::Bool => matches!(value, Value::Bool(_)),
        TypeDesc::Void => false,
        TypeDesc::Class(_) | TypeDesc::TClass(..) => matches!(value, Value::Null),
    }
}

/// General assignment compatibility (spec §4.2), used for `set`, parameter
/// binding, and return-value checks.
#[must_use]
pub fn assignment_compatible(registry: &ClassRegistry, target: &TypeDesc, value: &Value) -> bool {
    match target {
        TypeDesc::Int => matches!(value, Value::Int(_)),
        TypeDesc::String => matches!(value, Value::Str(_)),
        TypeDesc::Bool => matches!(value, Value::Bool(_)),
        TypeDesc::Void => false,
        TypeDesc::Class(class_name) => match value {
            Value::Null => true,
            Value::Object(obj) => registry.inherits(&obj.borrow().class_name, class_name),
            _ => false,
        },
        TypeDesc::TClass(..) => match value {
            Value::Null => true,
            Value::Object(obj) => obj.borrow().class_name == target.canonical_name(),
            _ => false,
        },
    }
}

/// Whether `==`/`!=` may even be applied to this pair of values (spec §4.7):
/// both primitive with the same tag, or both object/`null` with assignment
/// compatibility in either direction. Anything else — an int against a
/// string, or two objects from unrelated class hierarchies — is a TYPE
/// error rather than a silent `false`, matching `__executor_compare`'s
/// bidirectional `check_compatible_types` gate in the pre-distillation
/// source.
#[must_use]
pub fn equality_compatible(registry: &ClassRegistry, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_), Value::Int(_)) => true,
        (Value::Str(_), Value::Str(_)) => true,
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::Object(_)) | (Value::Object(_), Value::Null) => true,
        (Value::Object(x), Value::Object(y)) => {
            let (cx, cy) = (x.borrow().class_name.clone(), y.borrow().class_name.clone());
            registry.inherits(&cx, &cy) || registry.inherits(&cy, &cx)
        }
        _ => false,
    }
}

/// The error raised when overload resolution finds no matching signature.
#[must_use]
pub fn no_matching_overload(method_name: &str) -> InterpError {
    InterpError::new(ErrorKind::Name, format!("no matching overload for method '{method_name}'"))
}

/// Picks the first overload (in source order) whose parameter types are all
/// assignment-compatible with the given argument values (spec §4.2/§4.5.3).
#[must_use]
pub fn resolve_overload<'a>(
    registry: &ClassRegistry,
    overloads: &'a [MethodDecl],
    args: &[Value],
) -> Option<&'a MethodDecl> {
    overloads.iter().find(|m| {
        m.params.len() == args.len()
            && m.params.iter().zip(args).all(|(p, a)| assignment_compatible(registry, &p.ty, a))
    })
}

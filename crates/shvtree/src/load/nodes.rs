//! Loading of the `nodes` section.

use serde_json::Value as Json;

use crate::error::{LoadError, PropertyError};
use crate::load::{Attrs, Location};
use crate::model::{Access, Method, MethodFlags, NamedSet, Node, Signal};
use crate::types::{TypeRef, Types};

/// Loads node declarations, a mapping of names to declarations.
///
/// Type references are resolved in `types`, which must already be loaded.
pub fn load_nodes(data: &Json, types: &Types) -> Result<NamedSet<Node>, LoadError> {
    nodes(&Location::root().join("nodes"), data, types)
}

fn nodes(location: &Location, data: &Json, types: &Types) -> Result<NamedSet<Node>, LoadError> {
    let decls = data
        .as_object()
        .ok_or_else(|| location.error("Invalid format"))?;
    let mut res = NamedSet::new();
    for (name, decl) in decls {
        let loc = location.join(name.as_str());
        let node = node(&loc, name, decl, types)?;
        res.add(node).map_err(|err| loc.error(err.to_string()))?;
    }
    Ok(res)
}

fn node(loc: &Location, name: &str, decl: &Json, types: &Types) -> Result<Node, LoadError> {
    tracing::trace!(path = %loc.path(), "loading node");
    let mut node = Node::new(name);
    // `null` declares an empty node.
    if decl.is_null() {
        return Ok(node);
    }
    let mut attrs = Attrs::new(loc, decl)?;

    if let Some(children) = attrs.take("nodes") {
        node.nodes = nodes(&loc.join("nodes"), children, types)?;
    }
    if let Some(decls) = attrs.take("methods") {
        node.methods = methods(&loc.join("methods"), decls, types)?;
    }
    node.description = attrs.take_str("description")?.unwrap_or_default().to_string();

    // A Null property is the same as no property.
    if let Some(property) = attrs.take("property") {
        let prop_loc = loc.join("property");
        let readonly = attrs.take_bool("readonly")?.unwrap_or(false);
        let signal = match attrs.take("signal") {
            None => None,
            Some(Json::Bool(enabled)) => Some(Signal::from(*enabled)),
            Some(Json::String(name)) => Some(Signal::Named(name.clone())),
            Some(_) => return Err(loc.join("signal").error("Expected bool or string")),
        };
        let ty = type_ref(&prop_loc, property, types)?;
        node.make_property(ty, readonly, signal).map_err(|err| match err {
            PropertyError::MethodExists(_) => prop_loc.error(err.to_string()),
            PropertyError::SignalName(_) | PropertyError::Method(_) => {
                loc.join("signal").error(err.to_string())
            }
        })?;
    }

    attrs.finish("Unsupported keys")?;
    Ok(node)
}

fn methods(
    location: &Location,
    data: &Json,
    types: &Types,
) -> Result<NamedSet<Method>, LoadError> {
    let decls = data
        .as_object()
        .ok_or_else(|| location.error("Invalid format"))?;
    let mut res = NamedSet::new();
    for (name, decl) in decls {
        let loc = location.join(name.as_str());
        let method = method(&loc, name, decl, types)?;
        res.add(method).map_err(|err| loc.error(err.to_string()))?;
    }
    Ok(res)
}

fn method(loc: &Location, name: &str, decl: &Json, types: &Types) -> Result<Method, LoadError> {
    let mut method = Method::new(name).map_err(|err| loc.error(err.to_string()))?;
    if decl.is_null() {
        return Ok(method);
    }
    let mut attrs = Attrs::new(loc, decl)?;
    if let Some(param) = attrs.take("param") {
        method.param = type_ref(loc, param, types)?;
    }
    if let Some(result) = attrs.take("result") {
        method.result = type_ref(loc, result, types)?;
    }
    if let Some(access) = attrs.take_str("access")? {
        method.access = access
            .parse::<Access>()
            .map_err(|err| loc.join("access").error(err))?;
    }
    method.description = attrs.take_str("description")?.unwrap_or_default().to_string();
    if let Some(flags) = attrs.take("flags") {
        method.flags = method_flags(&loc.join("flags"), flags)?;
    }
    attrs.finish("Unsupported keys")?;
    Ok(method)
}

fn method_flags(loc: &Location, data: &Json) -> Result<MethodFlags, LoadError> {
    let names = data
        .as_array()
        .ok_or_else(|| loc.error("Invalid format"))?;
    names.iter().try_fold(MethodFlags::empty(), |flags, name| {
        let name = name.as_str().ok_or_else(|| loc.error("Expected string"))?;
        let flag = MethodFlags::parse_name(name)
            .ok_or_else(|| loc.error(format!("Invalid flag: {}", name.to_uppercase())))?;
        Ok(flags | flag)
    })
}

/// Type referenced by name; `null` means Null.
fn type_ref(loc: &Location, value: &Json, types: &Types) -> Result<TypeRef, LoadError> {
    match value {
        Json::Null => Ok(TypeRef::NULL),
        Json::String(name) => types
            .lookup(name)
            .ok_or_else(|| loc.error(format!("Invalid type reference name: {name}"))),
        other => Err(loc.error(format!("Invalid type reference name: {other}"))),
    }
}

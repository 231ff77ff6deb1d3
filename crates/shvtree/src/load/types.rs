//! Loading of the `types` section.

use serde_json::Value as Json;

use crate::error::{LoadError, TypeError};
use crate::limits::MAX_BITFIELD_BITS;
use crate::load::{Attrs, Location};
use crate::model::{Decimal, Value};
use crate::types::{
    BitfieldType, BlobType, DecimalType, DoubleType, EnumType, IMapType, IntType, ListType,
    MapType, ShvType, StringType, TupleType, TypeKind, TypeRef, Types,
};

/// Loads type declarations, a mapping of names to declarations.
///
/// A declaration is a type name (alias), a list of type references (one
/// of them) or a mapping whose `type` selects the kind.
pub fn load_types(data: &Json) -> Result<Types, LoadError> {
    let location = Location::root().join("types");
    let decls = data
        .as_object()
        .ok_or_else(|| location.error("Invalid format"))?;

    let mut loader = TypesLoader {
        types: Types::new(),
        bitfields: Vec::new(),
    };

    let mut pending = Vec::new();
    for (name, decl) in decls {
        let loc = location.join(name.as_str());
        if Types::builtins().contains(name) {
            return Err(loc.error("Redefining builtin types is not allowed"));
        }
        let id = loader.add(&loc, ShvType::unchecked(name.as_str(), placeholder()))?;
        if let Some(declaration) = loader.declare(&loc, id, decl)? {
            pending.push((loc, id, name.as_str(), declaration));
        }
    }

    for (loc, id, name, declaration) in pending {
        loader.build(&loc, id, name, declaration)?;
    }

    for bitfield in std::mem::take(&mut loader.bitfields) {
        loader.layout(bitfield)?;
    }

    let types = loader.types;
    if let Some(id) = types.find_self_reference() {
        let name = types.name_of(id).unwrap_or_default();
        return Err(location
            .join(name)
            .error(format!("Type '{name}' references itself")));
    }
    tracing::debug!(count = types.len(), "loaded types");
    Ok(types)
}

/// Kind of a declared type until its declaration is built. It matches
/// nothing and has no size.
fn placeholder() -> TypeKind {
    TypeKind::OneOf(Vec::new())
}

/// Declaration left for the second pass.
enum Declaration<'d> {
    Alias(&'d Json),
    OneOf(&'d [Json]),
    Compound(&'d str, Attrs<'d>),
}

/// Bitfield waiting for its components to be known.
struct PendingBitfield {
    location: Location,
    id: TypeRef,
    components: Option<Vec<(TypeRef, u32)>>,
    enum_type: Option<TypeRef>,
    strict: bool,
}

struct TypesLoader {
    types: Types,
    bitfields: Vec<PendingBitfield>,
}

impl TypesLoader {
    fn add(&mut self, loc: &Location, ty: ShvType) -> Result<TypeRef, LoadError> {
        self.types.add(ty).map_err(|err| loc.error(err.to_string()))
    }

    /// Sets the kind of a declared type. Kinds equal to a builtin become
    /// aliases of that builtin.
    fn define(&mut self, loc: &Location, id: TypeRef, kind: TypeKind) -> Result<(), LoadError> {
        let kind = match kind.builtin_equivalent().and_then(|b| self.types.lookup(b)) {
            Some(builtin) => TypeKind::Alias(builtin),
            None => kind,
        };
        tracing::trace!(
            name = self.types.name_of(id).unwrap_or_default(),
            kind = kind.kind_name(),
            "defining type"
        );
        self.types
            .define(id, kind)
            .map_err(|err| loc.error(err.to_string()))
    }

    /// Adds an anonymous type, such as an inline OneOf or Enum.
    fn add_anonymous(
        &mut self,
        loc: &Location,
        name: String,
        kind: TypeKind,
    ) -> Result<TypeRef, LoadError> {
        let id = self.add(loc, ShvType::unchecked(name, placeholder()))?;
        self.define(loc, id, kind)?;
        Ok(id)
    }

    fn named(&self, loc: &Location, name: &str) -> Result<TypeRef, LoadError> {
        self.types
            .lookup(name)
            .ok_or_else(|| loc.error(format!("Invalid type reference name: {name}")))
    }

    /// Resolves a type reference: a name, `null` for Null, or a list that
    /// declares an anonymous OneOf named after `owner`.
    fn reference(&mut self, loc: &Location, owner: &str, value: &Json) -> Result<TypeRef, LoadError> {
        match value {
            Json::Null => Ok(TypeRef::NULL),
            Json::String(name) => self.named(loc, name),
            Json::Array(items) => {
                let name = format!("{owner}OneOf");
                let id = self.add(loc, ShvType::unchecked(name.as_str(), placeholder()))?;
                let members = self.references(loc, &name, items)?;
                self.define(loc, id, TypeKind::OneOf(members))?;
                Ok(id)
            }
            other => Err(loc.error(format!("Invalid type reference: {other}"))),
        }
    }

    fn references(
        &mut self,
        loc: &Location,
        owner: &str,
        items: &[Json],
    ) -> Result<Vec<TypeRef>, LoadError> {
        items
            .iter()
            .map(|item| self.reference(loc, owner, item))
            .collect()
    }

    /// Enum referenced by name or declared inline as `<owner>Enum`.
    fn sub_enum(&mut self, loc: &Location, owner: &str, value: &Json) -> Result<TypeRef, LoadError> {
        if let Json::String(name) = value {
            let id = self.named(loc, name)?;
            return match self.types.get(id).map(ShvType::kind) {
                Some(TypeKind::Enum(_)) => Ok(id),
                _ => Err(loc.error(format!("Type '{name}' is not Enum"))),
            };
        }
        let values = enum_type(loc, value)?;
        self.add_anonymous(loc, format!("{owner}Enum"), TypeKind::Enum(values))
    }

    // -------------------------------------------------------------------------
    // First pass
    // -------------------------------------------------------------------------

    /// Builds scalar declarations, everything else is returned for the
    /// second pass.
    fn declare<'d>(
        &mut self,
        loc: &Location,
        id: TypeRef,
        decl: &'d Json,
    ) -> Result<Option<Declaration<'d>>, LoadError> {
        let map = match decl {
            Json::String(_) => return Ok(Some(Declaration::Alias(decl))),
            Json::Array(items) => return Ok(Some(Declaration::OneOf(items))),
            Json::Object(map) => map,
            other => {
                return Err(loc.error(format!("Invalid type description format: {other}")));
            }
        };
        let mut attrs = Attrs::from_map(loc, map);
        let kind_name = attrs
            .take_str("type")?
            .ok_or_else(|| loc.error("Missing 'type'"))?;
        let kind = match kind_name {
            "Int" => load_int(&mut attrs)?,
            "Double" => load_double(&mut attrs)?,
            "Decimal" => load_decimal(loc, &mut attrs)?,
            "String" => load_string(&mut attrs)?,
            "Blob" => load_blob(&mut attrs)?,
            "Enum" => {
                let values = match attrs.take("values") {
                    Some(values) => enum_type(&loc.join("values"), values)?,
                    None => EnumType::new(),
                };
                Ok(TypeKind::Enum(values))
            }
            "Constant" => {
                let value = attrs
                    .take("value")
                    .ok_or_else(|| loc.join("value").error("Use the builtin Null instead"))?;
                Ok(TypeKind::Constant(Value::from(value)))
            }
            "Bitfield" | "List" | "Tuple" | "Map" | "IMap" => {
                return Ok(Some(Declaration::Compound(kind_name, attrs)));
            }
            other => return Err(loc.join("type").error(format!("Unknown type kind: {other}"))),
        }
        .map_err(|err: TypeError| loc.error(err.to_string()))?;
        attrs.finish("Invalid keys")?;
        self.define(loc, id, kind)?;
        Ok(None)
    }

    // -------------------------------------------------------------------------
    // Second pass
    // -------------------------------------------------------------------------

    fn build(
        &mut self,
        loc: &Location,
        id: TypeRef,
        name: &str,
        declaration: Declaration<'_>,
    ) -> Result<(), LoadError> {
        let kind = match declaration {
            Declaration::Alias(target) => TypeKind::Alias(self.reference(loc, name, target)?),
            Declaration::OneOf(items) => TypeKind::OneOf(self.references(loc, name, items)?),
            Declaration::Compound(kind_name, mut attrs) => {
                let kind = match kind_name {
                    "Bitfield" => {
                        self.load_bitfield(loc, id, name, &mut attrs)?;
                        None
                    }
                    "List" => Some(self.load_list(loc, name, &mut attrs)?),
                    "Tuple" => Some(self.load_tuple(loc, name, &mut attrs)?),
                    "Map" => Some(self.load_map(loc, name, &mut attrs)?),
                    _ => Some(self.load_imap(loc, name, &mut attrs)?),
                };
                attrs.finish("Invalid keys")?;
                match kind {
                    Some(kind) => kind,
                    None => return Ok(()),
                }
            }
        };
        self.define(loc, id, kind)
    }

    fn load_bitfield(
        &mut self,
        loc: &Location,
        id: TypeRef,
        name: &str,
        attrs: &mut Attrs<'_>,
    ) -> Result<(), LoadError> {
        let components = match attrs.take("types") {
            Some(types) => {
                let loc = loc.join("types");
                let mut components = Vec::new();
                for (component, bit) in enum_like(&loc, types)? {
                    let bit = u32::try_from(bit)
                        .ok()
                        .filter(|&b| b < MAX_BITFIELD_BITS)
                        .ok_or_else(|| loc.error(format!("Bit {bit} is out of range")))?;
                    components.push((self.named(&loc, component)?, bit));
                }
                Some(components)
            }
            None => None,
        };
        let enum_type = attrs
            .take("enum")
            .map(|e| self.sub_enum(&loc.join("enum"), name, e))
            .transpose()?;
        let strict = attrs.take_bool("strict")?.unwrap_or(true);
        self.bitfields.push(PendingBitfield {
            location: loc.clone(),
            id,
            components,
            enum_type,
            strict,
        });
        Ok(())
    }

    fn load_list(
        &mut self,
        loc: &Location,
        name: &str,
        attrs: &mut Attrs<'_>,
    ) -> Result<TypeKind, LoadError> {
        let min_len = attrs.take_usize("minlen")?.unwrap_or(0);
        let max_len = attrs.take_usize("maxlen")?;
        let allowed = match attrs.take("allowed") {
            Some(allowed) => self.reference(&loc.join("allowed"), name, allowed)?,
            None => TypeRef::NULL,
        };
        Ok(TypeKind::List(ListType::with_len(allowed, min_len, max_len)))
    }

    fn load_tuple(
        &mut self,
        loc: &Location,
        name: &str,
        attrs: &mut Attrs<'_>,
    ) -> Result<TypeKind, LoadError> {
        let mut tuple = TupleType::default();
        if let Some(items) = attrs.take("items") {
            let items = items
                .as_array()
                .ok_or_else(|| loc.join("items").error("Invalid format"))?;
            for (i, item) in items.iter().enumerate() {
                let item_loc = loc.join(format!("items[{i}]"));
                tuple
                    .items
                    .push(self.reference(&item_loc, &format!("{name}{i}"), item)?);
            }
        }
        if let Some(e) = attrs.take("enum") {
            tuple.enum_type = Some(self.sub_enum(&loc.join("enum"), name, e)?);
        }
        Ok(TypeKind::Tuple(tuple))
    }

    fn load_map(
        &mut self,
        loc: &Location,
        name: &str,
        attrs: &mut Attrs<'_>,
    ) -> Result<TypeKind, LoadError> {
        let mut map = MapType::default();
        if let Some(fields) = attrs.take("fields") {
            let loc = loc.join("fields");
            let fields = fields
                .as_object()
                .ok_or_else(|| loc.error("Expected mapping"))?;
            for (key, value) in fields {
                let field = self.reference(&loc.join(key.as_str()), &format!("{name}{key}"), value)?;
                map.fields.insert(key.clone(), field);
            }
        }
        Ok(TypeKind::Map(map))
    }

    fn load_imap(
        &mut self,
        loc: &Location,
        name: &str,
        attrs: &mut Attrs<'_>,
    ) -> Result<TypeKind, LoadError> {
        let mut imap = IMapType::default();
        if let Some(e) = attrs.take("enum") {
            imap.enum_type = Some(self.sub_enum(&loc.join("enum"), name, e)?);
        }
        let Some(fields) = attrs.take("fields") else {
            return Ok(TypeKind::IMap(imap));
        };
        let loc = loc.join("fields");
        match fields {
            Json::Object(fields) => {
                for (key, value) in fields {
                    let index = self.imap_key(&loc, imap.enum_type, key)?;
                    let field = self.reference(&loc.join(key.as_str()), &format!("{name}{key}"), value)?;
                    imap.fields.insert(index, field);
                }
            }
            Json::Array(items) => {
                let mut next: i64 = 0;
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Json::String(_) => {
                            let field = self.reference(&loc, &format!("{name}{next}"), item)?;
                            imap.fields.insert(next, field);
                            next = next.saturating_add(1);
                        }
                        Json::Object(entries) => {
                            let item_loc = loc.join(format!("fields[{i}]"));
                            for (type_name, index) in entries {
                                let index = index.as_i64().ok_or_else(|| {
                                    item_loc.join(type_name.as_str()).error("Expected integer")
                                })?;
                                imap.fields.insert(index, self.named(&item_loc, type_name)?);
                                next = index.saturating_add(1);
                            }
                        }
                        _ => return Err(loc.error("Invalid fields format")),
                    }
                }
            }
            _ => return Err(loc.error("Invalid format")),
        }
        Ok(TypeKind::IMap(imap))
    }

    /// Integer key of an IMap field given by an enum name or a number.
    fn imap_key(
        &self,
        loc: &Location,
        enum_type: Option<TypeRef>,
        key: &str,
    ) -> Result<i64, LoadError> {
        let by_name = enum_type
            .and_then(|id| match self.types.get(id)?.kind() {
                TypeKind::Enum(e) => e.get(key),
                _ => None,
            })
            .and_then(|v| i64::try_from(v).ok());
        by_name
            .or_else(|| key.parse().ok())
            .ok_or_else(|| loc.error(format!("Invalid key: {key}")))
    }

    // -------------------------------------------------------------------------
    // Third pass
    // -------------------------------------------------------------------------

    fn layout(&mut self, pending: PendingBitfield) -> Result<(), LoadError> {
        let loc = &pending.location;
        let error = |err: TypeError| loc.error(err.to_string());
        let mut bitfield = match (&pending.components, pending.enum_type) {
            (Some(components), _) => {
                let mut bitfield = BitfieldType::new();
                for &(ty, bit) in components {
                    bitfield.set(bit, ty, &self.types).map_err(error)?;
                }
                bitfield
            }
            (None, Some(enum_id)) => match self.types.get(enum_id).map(ShvType::kind) {
                Some(TypeKind::Enum(values)) => {
                    BitfieldType::from_enum(enum_id, values).map_err(error)?
                }
                _ => return Err(loc.join("enum").error("Bitfield enum must be Enum")),
            },
            (None, None) => BitfieldType::new(),
        };
        bitfield.enum_type = pending.enum_type;
        bitfield.strict = pending.strict;
        self.define(loc, pending.id, TypeKind::Bitfield(bitfield))
    }
}

// =============================================================================
// SCALARS
// =============================================================================

fn load_int(attrs: &mut Attrs<'_>) -> Result<Result<TypeKind, TypeError>, LoadError> {
    let minimum = attrs.take_i128("minimum")?;
    let maximum = attrs.take_i128("maximum")?;
    let multiple_of = attrs.take_i128("multipleOf")?;
    let unsigned = attrs.take_bool("unsigned")?;
    Ok(IntType::new(minimum, maximum, multiple_of, unsigned).map(TypeKind::Int))
}

fn load_double(attrs: &mut Attrs<'_>) -> Result<Result<TypeKind, TypeError>, LoadError> {
    let minimum = attrs.take_f64("minimum")?;
    let maximum = attrs.take_f64("maximum")?;
    let exclusive_minimum = attrs.take_f64("exclusiveMinimum")?;
    let exclusive_maximum = attrs.take_f64("exclusiveMaximum")?;
    let multiple_of = attrs.take_f64("multipleOf")?;
    Ok(DoubleType::new(
        minimum,
        maximum,
        exclusive_minimum,
        exclusive_maximum,
        multiple_of,
    )
    .map(TypeKind::Double))
}

fn load_decimal(
    loc: &Location,
    attrs: &mut Attrs<'_>,
) -> Result<Result<TypeKind, TypeError>, LoadError> {
    let mut bound = |key: &str| {
        attrs
            .take(key)
            .map(|v| decimal(&loc.join(key), v))
            .transpose()
    };
    let minimum = bound("minimum")?;
    let maximum = bound("maximum")?;
    Ok(DecimalType::new(minimum, maximum).map(TypeKind::Decimal))
}

/// Decimal bound given as a number or a string.
fn decimal(loc: &Location, value: &Json) -> Result<Decimal, LoadError> {
    let text = match value {
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.clone(),
        _ => return Err(loc.error("Expected decimal")),
    };
    text.parse().map_err(|_| loc.error("Expected decimal"))
}

/// `length` sets both bounds unless they are given explicitly.
fn lengths(attrs: &mut Attrs<'_>) -> Result<(Option<usize>, Option<usize>), LoadError> {
    let length = attrs.take_usize("length")?;
    let min_length = attrs.take_usize("minLength")?.or(length);
    let max_length = attrs.take_usize("maxLength")?.or(length);
    Ok((min_length, max_length))
}

fn load_string(attrs: &mut Attrs<'_>) -> Result<Result<TypeKind, TypeError>, LoadError> {
    let (min_length, max_length) = lengths(attrs)?;
    let pattern = attrs.take_str("pattern")?;
    Ok(StringType::new(min_length, max_length, pattern).map(TypeKind::String))
}

fn load_blob(attrs: &mut Attrs<'_>) -> Result<Result<TypeKind, TypeError>, LoadError> {
    let (min_length, max_length) = lengths(attrs)?;
    Ok(BlobType::new(min_length, max_length).map(TypeKind::Blob))
}

// =============================================================================
// ENUM-LIKE LISTS
// =============================================================================

/// Reads a list assigning consecutive numbers to names.
///
/// A name takes the next number, `null` skips one number and an integer
/// skips that many. A mapping assigns explicit numbers and the next name
/// continues after the last of them.
fn enum_like<'d>(loc: &Location, values: &'d Json) -> Result<Vec<(&'d str, u64)>, LoadError> {
    let items = values
        .as_array()
        .ok_or_else(|| loc.error("Expected list"))?;
    let mut res = Vec::with_capacity(items.len());
    let mut next: u64 = 0;
    for item in items {
        match item {
            Json::Null => next = next.saturating_add(1),
            Json::String(name) => {
                res.push((name.as_str(), next));
                next = next.saturating_add(1);
            }
            Json::Number(n) if n.is_u64() => {
                next = next.saturating_add(n.as_u64().unwrap_or_default());
            }
            Json::Object(entries) => {
                for (name, value) in entries {
                    let value = value
                        .as_u64()
                        .ok_or_else(|| loc.join(name.as_str()).error("Expected integer"))?;
                    res.push((name.as_str(), value));
                    next = value.saturating_add(1);
                }
            }
            other => return Err(loc.error(format!("Invalid value specifier: {other}"))),
        }
    }
    Ok(res)
}

fn enum_type(loc: &Location, values: &Json) -> Result<EnumType, LoadError> {
    let mut res = EnumType::new();
    for (name, value) in enum_like(loc, values)? {
        res.insert(name, value);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::BitKey;

    fn load(data: Json) -> Types {
        load_types(&data).unwrap()
    }

    fn load_err(data: Json) -> String {
        load_types(&data).unwrap_err().to_string()
    }

    fn kind<'a>(types: &'a Types, name: &str) -> &'a TypeKind {
        types.get(types.lookup(name).unwrap()).unwrap().kind()
    }

    #[test]
    fn test_scalars() {
        let types = load(json!({
            "foo": {"type": "Int", "minimum": 8, "maximum": 12},
            "even": {"type": "Int", "multipleOf": 2},
            "temp": {"type": "Double", "minimum": -40, "exclusiveMaximum": 125.5},
            "price": {"type": "Decimal", "minimum": "0", "maximum": 99.99},
            "label": {"type": "String", "maxLength": 8, "pattern": "[a-z]+"},
            "serial": {"type": "Blob", "length": 4},
            "last": {"type": "Constant", "value": "last"},
        }));
        assert_eq!(kind(&types, "foo"), &TypeKind::Int(IntType::range(8, 12).unwrap()));
        assert_eq!(
            kind(&types, "even"),
            &TypeKind::Int(IntType::new(None, None, Some(2), None).unwrap())
        );
        let temp = types.get_type("temp").unwrap();
        assert!(temp.validate(&Value::Double(-40.0)));
        assert!(!temp.validate(&Value::Double(125.5)));
        let price = types.get_type("price").unwrap();
        assert!(price.validate(&Value::Decimal(Decimal::new(9999, -2))));
        assert!(!price.validate(&Value::Decimal(Decimal::new(100, 0))));
        let label = types.get_type("label").unwrap();
        assert!(label.validate(&Value::from("abc")));
        assert!(!label.validate(&Value::from("ABC")));
        assert_eq!(
            kind(&types, "serial"),
            &TypeKind::Blob(BlobType::new(Some(4), Some(4)).unwrap())
        );
        assert_eq!(kind(&types, "last"), &TypeKind::Constant(Value::from("last")));
    }

    #[test]
    fn test_forward_reference() {
        let types = load(json!({"A": "B", "B": {"type": "Int"}}));
        let b = types.lookup("B").unwrap();
        assert_eq!(kind(&types, "A"), &TypeKind::Alias(b));
        // Same as the builtin, so it is an alias of it.
        assert_eq!(kind(&types, "B"), &TypeKind::Alias(TypeRef::INT));
        assert_eq!(types.get_type("A").unwrap(), Types::builtin("Int").unwrap());
    }

    #[test]
    fn test_mutual_references() {
        let types = load(json!({
            "value": ["Null", "Int", "pair"],
            "pair": {"type": "Tuple", "items": ["String", "value"], "enum": ["key", "value"]},
        }));
        let value = types.lookup("value").unwrap();
        let pair = types.lookup("pair").unwrap();
        assert_eq!(
            kind(&types, "value"),
            &TypeKind::OneOf(vec![TypeRef::NULL, TypeRef::INT, pair])
        );
        let TypeKind::Tuple(tuple) = kind(&types, "pair") else {
            panic!("pair is not a tuple");
        };
        assert_eq!(tuple.items, [TypeRef::STRING, value]);
        assert_eq!(types.name_of(tuple.enum_type.unwrap()), Some("pairEnum"));

        let nested = Value::List(vec![
            Value::from("a"),
            Value::List(vec![Value::from("b"), Value::Int(1)]),
        ]);
        assert!(types.validate(value, &nested));
        assert_eq!(types.encoded_size(value), None);
    }

    #[test]
    fn test_enum_like_values() {
        let types = load(json!({
            "status": {"type": "Enum", "values": ["ok", null, "warn", 3, "error", {"fatal": 10}, "dead"]},
        }));
        let TypeKind::Enum(e) = kind(&types, "status") else {
            panic!("status is not an enum");
        };
        let values: Vec<_> = e.iter().collect();
        assert_eq!(
            values,
            [("ok", 0), ("warn", 2), ("error", 6), ("fatal", 10), ("dead", 11)]
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "Enum", "values": [0.0]}})),
            "types.foo.values: Invalid value specifier: 0.0"
        );
    }

    #[test]
    fn test_anonymous_types() {
        let types = load(json!({
            "lst": {"type": "List", "allowed": ["Int", "String"], "maxlen": 3},
            "version": {"type": "Map", "fields": {"major": "Int", "minor": ["Null", "Int"]}},
        }));
        assert_eq!(
            kind(&types, "lstOneOf"),
            &TypeKind::OneOf(vec![TypeRef::INT, TypeRef::STRING])
        );
        let TypeKind::Map(map) = kind(&types, "version") else {
            panic!("version is not a map");
        };
        assert_eq!(types.name_of(map.fields["minor"]), Some("versionminorOneOf"));
        let TypeKind::List(list) = kind(&types, "lst") else {
            panic!("lst is not a list");
        };
        assert_eq!(list.max_len, Some(3));
        assert_eq!(list.min_len, 0);
    }

    #[test]
    fn test_list_defaults_to_null_items() {
        let types = load(json!({"nulls": {"type": "List"}}));
        assert_eq!(
            kind(&types, "nulls"),
            &TypeKind::List(ListType::new(TypeRef::NULL))
        );
    }

    #[test]
    fn test_imap_fields() {
        let types = load(json!({
            "propEnum": {"type": "Enum", "values": ["boolean", "integer"]},
            "byName": {"type": "IMap", "enum": "propEnum", "fields": {"boolean": "Bool", "integer": "Int"}},
            "byList": {"type": "IMap", "fields": ["Bool", {"Int": 5}, "String"]},
            "byNumber": {"type": "IMap", "fields": {"7": "Bool"}},
        }));
        let TypeKind::IMap(by_name) = kind(&types, "byName") else {
            panic!("byName is not an imap");
        };
        assert_eq!(by_name.field(0), Some(TypeRef::BOOL));
        assert_eq!(by_name.field(1), Some(TypeRef::INT));
        let TypeKind::IMap(by_list) = kind(&types, "byList") else {
            panic!("byList is not an imap");
        };
        let fields: Vec<_> = by_list.fields.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(
            fields,
            [(0, TypeRef::BOOL), (5, TypeRef::INT), (6, TypeRef::STRING)]
        );
        let TypeKind::IMap(by_number) = kind(&types, "byNumber") else {
            panic!("byNumber is not an imap");
        };
        assert_eq!(by_number.field(7), Some(TypeRef::BOOL));

        assert_eq!(
            load_err(json!({"foo": {"type": "IMap", "fields": [3]}})),
            "types.foo.fields: Invalid fields format"
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "IMap", "fields": {"bar": "Int"}}})),
            "types.foo.fields: Invalid key: bar"
        );
    }

    #[test]
    fn test_bitfield() {
        let types = load(json!({
            "mode": {"type": "Enum", "values": ["off", "low", "high"]},
            "level": "UInt8",
            "status": {"type": "Bitfield", "types": ["Bool", "mode", null, "level"]},
            "flags": {"type": "Bitfield", "enum": ["ready", "busy", {"error": 4}]},
            "lax": {"type": "Bitfield", "types": ["Bool"], "strict": false},
        }));
        let status = types.lookup("status").unwrap();
        let TypeKind::Bitfield(bitfield) = kind(&types, "status") else {
            panic!("status is not a bitfield");
        };
        // Bool at 0, mode at 1-2, level at 3-10.
        assert_eq!(bitfield.bitsize(), 11);
        assert_eq!(bitfield.get(1), Ok(types.lookup("mode").unwrap()));
        assert_eq!(bitfield.get(3), Ok(types.lookup("level").unwrap()));
        assert_eq!(types.encoded_size(status), Some(3));

        let TypeKind::Bitfield(flags) = kind(&types, "flags") else {
            panic!("flags is not a bitfield");
        };
        assert_eq!(flags.bitsize(), 5);
        assert_eq!(flags.get_key(BitKey::Alias("error"), &types), Ok(TypeRef::BOOL));
        let flags_ref = types.lookup("flags").unwrap();
        assert!(types.validate(flags_ref, &Value::UInt(0b10001)));
        assert!(!types.validate(flags_ref, &Value::UInt(0b00100)));

        let lax = types.lookup("lax").unwrap();
        assert!(types.validate(lax, &Value::UInt(0b110)));
    }

    #[test]
    fn test_bitfield_errors() {
        assert_eq!(
            load_err(json!({"foo": {"type": "Bitfield", "types": ["Int"]}})),
            "types.foo: Type Int can't be included in bitfield"
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "Bitfield", "types": ["UInt8", {"Bool": 3}]}})),
            "types.foo: Bits 3..4 overlap with already assigned bits"
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(load_err(json!(true)), "types: Invalid format");
        assert_eq!(
            load_err(json!({"Double": {"type": "Double", "minimum": 0}})),
            "types.Double: Redefining builtin types is not allowed"
        );
        assert_eq!(load_err(json!({"notype": {}})), "types.notype: Missing 'type'");
        assert_eq!(
            load_err(json!({"toomuch": {"type": "List", "invalid": null, "extra": 1}})),
            "types.toomuch: Invalid keys: invalid, extra"
        );
        assert_eq!(
            load_err(json!({"missing": "nosuchtype"})),
            "types.missing: Invalid type reference name: nosuchtype"
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "Tuple", "enum": "Int"}})),
            "types.foo.enum: Type 'Int' is not Enum"
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "Int", "minimum": 1.5}})),
            "types.foo.minimum: Expected integer"
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "Int", "minimum": -1, "unsigned": true}})),
            "types.foo: Unsigned type can't have negative minimum"
        );
        assert_eq!(
            load_err(json!({"foo": {"type": "Money"}})),
            "types.foo.type: Unknown type kind: Money"
        );
        assert_eq!(load_err(json!({"foo": 5})), "types.foo: Invalid type description format: 5");
        assert_eq!(
            load_err(json!({"foo": {"type": "Constant"}})),
            "types.foo.value: Use the builtin Null instead"
        );
        assert_eq!(load_err(json!({"foo": []})), "types.foo: OneOf must list at least one type");
    }

    #[test]
    fn test_self_reference_rejected() {
        assert_eq!(load_err(json!({"a": "a"})), "types.a: Type 'a' references itself");
        assert_eq!(
            load_err(json!({"a": ["Null", "b"], "b": "a"})),
            "types.a: Type 'a' references itself"
        );
        // Containers make recursion legitimate.
        load(json!({"tree": {"type": "List", "allowed": ["Int", "tree"]}}));
    }
}

//! Attribute parsing for the `Entity` and `Lineage` derives

use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, Attribute, Data, DeriveInput, Error,
    Fields, Ident, LitStr, Result, Token, Type,
};

/// Compile-time counterpart of `store_object::SqlIdentifier`
pub fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }

    if name.len() > 63 {
        return Err(format!("'{}' is {} characters long (max 63)", name, name.len()));
    }

    let first = name.chars().next().unwrap_or('0');
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(format!("'{}' must start with a letter or underscore", name));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "'{}' may only contain ASCII letters, digits and underscores",
            name
        ));
    }

    if is_reserved_keyword(name) {
        return Err(format!("'{}' is a reserved SQL keyword", name));
    }

    Ok(())
}

fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        "ALL", "ALTER", "AND", "ANY", "ARRAY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK",
        "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT",
        "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM",
        "FULL", "GRANT", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
        "JOIN", "LEFT", "LIKE", "ILIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER",
        "OUTER", "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN",
        "TO", "TRUE", "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WITH",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

#[derive(Debug)]
pub struct EntityInfo {
    pub table: String,
    pub key_field: Ident,
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Read `#[entity(table = "...")]` and the `#[key]` field
///
/// Without a `#[key]` attribute a field named `id` is the key.
pub fn parse_entity(input: &DeriveInput) -> Result<EntityInfo> {
    let mut table = None;

    for attr in &input.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let value: LitStr = meta.value()?.parse()?;
                    validate_identifier(&value.value()).map_err(|e| {
                        Error::new(value.span(), format!("Invalid table name {}", e))
                    })?;
                    table = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported entity attribute, expected `table`"))
                }
            })?;
        }
    }

    let table = table.ok_or_else(|| {
        Error::new_spanned(
            &input.ident,
            "entity attribute is required: add #[entity(table = \"table_name\")] to your struct",
        )
    })?;

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "Entity can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new_spanned(
            &input.ident,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut marked = fields
        .named
        .iter()
        .filter(|field| has_attribute(&field.attrs, "key"))
        .filter_map(|field| field.ident.clone());

    let key_field = match (marked.next(), marked.next()) {
        (Some(key), None) => key,
        (Some(_), Some(second)) => {
            return Err(Error::new_spanned(second, "only one field may be marked #[key]"));
        }
        (None, _) => fields
            .named
            .iter()
            .filter_map(|field| field.ident.clone())
            .find(|ident| ident == "id")
            .ok_or_else(|| {
                Error::new_spanned(
                    &input.ident,
                    "mark the primary key field with #[key] or name it `id`",
                )
            })?,
    };

    validate_identifier(&key_field.to_string())
        .map_err(|e| Error::new(key_field.span(), format!("Invalid key field {}", e)))?;

    Ok(EntityInfo { table, key_field })
}

/// One ancestor in `#[lineage(...)]`: a type, optionally reached through a field
pub struct Ancestor {
    pub ty: Type,
    pub field: Option<Ident>,
}

impl Parse for Ancestor {
    fn parse(input: ParseStream) -> Result<Self> {
        let ty: Type = input.parse()?;
        let field = if input.peek(Token![=>]) {
            let _: Token![=>] = input.parse()?;
            Some(input.parse()?)
        } else {
            None
        };
        Ok(Ancestor { ty, field })
    }
}

/// Collect every `#[lineage(...)]` entry in declaration order
pub fn parse_lineage(attrs: &[Attribute]) -> Result<Vec<Ancestor>> {
    let mut ancestors = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("lineage") {
            let list = attr.parse_args_with(Punctuated::<Ancestor, Token![,]>::parse_terminated)?;
            ancestors.extend(list);
        }
    }
    Ok(ancestors)
}

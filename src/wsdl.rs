//! Root document parsing
//!
//! Reads a WSDL (1.1 or 2.0) or a standalone XSD with `roxmltree` and pulls out
//! the embedded schema fragments together with the `schemaLocation` values of
//! their `import`/`include`/`redefine`/`override` children. Nothing here
//! touches the referenced files; following them is the collector's job.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;

use crate::error::ParseError;

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const WSDL11_NS: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const WSDL20_NS: &str = "http://www.w3.org/ns/wsdl";

/// Schema composition element carrying a `schemaLocation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    Import,
    Include,
    Redefine,
    Override,
}

impl Directive {
    fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "import" => Some(Directive::Import),
            "include" => Some(Directive::Include),
            "redefine" => Some(Directive::Redefine),
            "override" => Some(Directive::Override),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::Import => "import",
            Directive::Include => "include",
            Directive::Redefine => "redefine",
            Directive::Override => "override",
        }
    }
}

/// One raw `schemaLocation` reference, exactly as written in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRef {
    pub directive: Directive,
    pub location: String,
}

/// A parsed schema element: the file it lives in and the references it makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFragment {
    pub document: PathBuf,
    pub target_namespace: Option<String>,
    pub locations: Vec<LocationRef>,
}

impl SchemaFragment {
    /// Build a fragment from an `xs:schema` element node.
    ///
    /// Only direct children are inspected. Directives without a `schemaLocation`,
    /// or with a blank one, are legal (an import may be satisfied elsewhere) and
    /// are dropped here.
    pub fn from_node(schema: Node<'_, '_>, document: &Path) -> Self {
        let locations = schema
            .children()
            .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XSD_NS))
            .filter_map(|n| {
                let directive = Directive::from_local_name(n.tag_name().name())?;
                let location = n.attribute("schemaLocation")?.trim();
                if location.is_empty() {
                    return None;
                }
                Some(LocationRef {
                    directive,
                    location: location.to_string(),
                })
            })
            .collect();

        Self {
            document: document.to_path_buf(),
            target_namespace: schema.attribute("targetNamespace").map(str::to_string),
            locations,
        }
    }
}

/// What kind of document a root turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Wsdl,
    Schema,
}

/// A parsed root document ready for the reference walk
#[derive(Debug, Clone)]
pub struct RootDocument {
    /// Canonical path of the document
    pub path: PathBuf,
    pub kind: RootKind,
    pub fragments: Vec<SchemaFragment>,
}

impl RootDocument {
    /// Directory against which the root's own schema locations resolve
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("/"))
    }
}

fn parsing_options() -> ParsingOptions {
    // Published schemas (XMLSchema.xsd among them) still ship with a DOCTYPE.
    ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    }
}

fn describe(node: Node<'_, '_>) -> String {
    match node.tag_name().namespace() {
        Some(ns) => format!("{{{}}}{}", ns, node.tag_name().name()),
        None => node.tag_name().name().to_string(),
    }
}

fn is_wsdl_root(node: Node<'_, '_>) -> bool {
    matches!(
        (node.tag_name().namespace(), node.tag_name().name()),
        (Some(WSDL11_NS), "definitions") | (Some(WSDL20_NS), "description")
    )
}

fn is_schema(node: Node<'_, '_>) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(XSD_NS) && node.tag_name().name() == "schema"
}

/// Parse the text of a root document (WSDL or XSD)
pub fn parse_root(path: &Path, content: &str) -> Result<RootDocument, ParseError> {
    let doc = Document::parse_with_options(content, parsing_options())
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    let root = doc.root_element();

    if is_schema(root) {
        return Ok(RootDocument {
            path: path.to_path_buf(),
            kind: RootKind::Schema,
            fragments: vec![SchemaFragment::from_node(root, path)],
        });
    }

    if !is_wsdl_root(root) {
        return Err(ParseError::new(
            path,
            format!(
                "root element {} is neither a WSDL definitions/description nor an xs:schema",
                describe(root)
            ),
        ));
    }

    let wsdl_ns = root.tag_name().namespace();
    let fragments = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == wsdl_ns)
        .filter(|n| n.tag_name().name() == "types")
        .flat_map(|types| types.children().filter(|n| is_schema(*n)))
        .map(|schema| SchemaFragment::from_node(schema, path))
        .collect();

    Ok(RootDocument {
        path: path.to_path_buf(),
        kind: RootKind::Wsdl,
        fragments,
    })
}

/// Parse the text of a referenced schema document
pub fn parse_schema(path: &Path, content: &str) -> Result<SchemaFragment, ParseError> {
    let doc = Document::parse_with_options(content, parsing_options())
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    let root = doc.root_element();

    if !is_schema(root) {
        return Err(ParseError::new(
            path,
            format!("root element {} is not xs:schema", describe(root)),
        ));
    }

    Ok(SchemaFragment::from_node(root, path))
}

/// Read and parse a root document from disk.
///
/// The path is canonicalized first so that schema locations resolve against
/// the real directory of the file.
pub async fn load_root(path: &Path) -> Result<RootDocument, ParseError> {
    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    let content = tokio::fs::read_to_string(&canonical)
        .await
        .map_err(|e| ParseError::new(&canonical, e.to_string()))?;
    parse_root(&canonical, &content)
}

/// Read and parse a referenced schema file (already canonical)
pub async fn load_schema(path: &Path) -> Result<SchemaFragment, ParseError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    parse_schema(path, &content)
}

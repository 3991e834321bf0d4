#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for on-disk WSDL/XSD trees
pub struct SchemaTree {
    pub temp_dir: TempDir,
}

impl SchemaTree {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Canonical form of a path inside the tree
    pub fn canonical(&self, relative: &str) -> PathBuf {
        self.path(relative).canonicalize().unwrap()
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write an XSD whose top level holds the given `(directive, schemaLocation)` pairs
    pub fn schema(&self, relative: &str, directives: &[(&str, &str)]) -> PathBuf {
        self.write(relative, &schema_document(directives))
    }

    /// Write a WSDL 1.1 document with one embedded schema per entry of `schemas`
    pub fn wsdl(&self, relative: &str, schemas: &[&[(&str, &str)]]) -> PathBuf {
        let mut types = String::new();
        for directives in schemas {
            types.push_str("    <xsd:schema targetNamespace=\"urn:test\">\n");
            for (directive, location) in directives.iter() {
                types.push_str(&format!(
                    "      <xsd:{} schemaLocation=\"{}\"/>\n",
                    directive, location
                ));
            }
            types.push_str("    </xsd:schema>\n");
        }

        self.write(
            relative,
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                  targetNamespace="urn:test">
  <wsdl:types>
{}  </wsdl:types>
</wsdl:definitions>
"#,
                types
            ),
        )
    }

    /// Write arbitrary text, e.g. a malformed document
    pub fn raw(&self, relative: &str, content: &str) -> PathBuf {
        self.write(relative, content)
    }
}

pub fn schema_document(directives: &[(&str, &str)]) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">\n",
    );
    for (directive, location) in directives {
        body.push_str(&format!(
            "  <xs:{} schemaLocation=\"{}\"/>\n",
            directive, location
        ));
    }
    body.push_str("</xs:schema>\n");
    body
}

use crate::error::{CatalogError, ParseError};
use crate::types::CatalogDocument;
use crate::validate::validate_catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedCatalog {
    pub catalog: CatalogDocument,
    pub format: DocumentFormat,
}

pub fn parse_catalog_str(input: &str, format: DocumentFormat) -> Result<ParsedCatalog, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedCatalog {
            catalog: serde_json::from_str::<CatalogDocument>(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedCatalog {
            catalog: serde_yaml::from_str::<CatalogDocument>(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_catalog_auto(input),
    }
}

/// Parse and validate in one go.
pub fn load_catalog_str(input: &str) -> Result<CatalogDocument, CatalogError> {
    let parsed = parse_catalog_str(input, DocumentFormat::Auto)?;
    validate_catalog(&parsed.catalog)?;
    Ok(parsed.catalog)
}

fn parse_catalog_auto(input: &str) -> Result<ParsedCatalog, ParseError> {
    // JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<CatalogDocument>(input) {
            Ok(catalog) => Ok(ParsedCatalog {
                catalog,
                format: DocumentFormat::Json,
            }),
            Err(e) => match serde_yaml::from_str::<CatalogDocument>(input) {
                Ok(catalog) => Ok(ParsedCatalog {
                    catalog,
                    format: DocumentFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    match serde_yaml::from_str::<CatalogDocument>(input) {
        Ok(catalog) => Ok(ParsedCatalog {
            catalog,
            format: DocumentFormat::Yaml,
        }),
        Err(e) => {
            if let Ok(catalog) = serde_json::from_str::<CatalogDocument>(input) {
                return Ok(ParsedCatalog {
                    catalog,
                    format: DocumentFormat::Json,
                });
            }
            Err(ParseError::Yaml(e))
        }
    }
}

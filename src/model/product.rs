//! Product documents and their normalization.
//!
//! Products are stored as raw BSON because the collection has been written by
//! several generations of tooling: names live under `name`, `titulo` or
//! `nombre`, prices may be currency strings, images may be a list, a
//! `{cover, all}` document or a `{portada, lista_completa}` document, and tags
//! may be a comma separated string. [`NormalizedProduct::from_document`]
//! resolves all of that into one canonical shape before anything else
//! touches it.

use bson::{doc, Bson, Document};
use serde::Serialize;

pub const UNTITLED_PRODUCT: &str = "Untitled product";
pub const DEFAULT_CATEGORY: &str = "General";
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads/";

const NAME_KEYS: &[&str] = &["name", "titulo", "nombre"];
const DESCRIPTION_KEYS: &[&str] = &["description", "descripcion"];
const PRICE_KEYS: &[&str] = &["price", "precio"];
const IMAGE_KEYS: &[&str] = &["image", "images.cover", "imagenes.portada", "imagenes.cover"];
const GALLERY_KEYS: &[&str] = &[
    "images",
    "images.all",
    "imagenes.lista_completa",
    "imagenes.all",
    "imagenes",
];
const TAG_KEYS: &[&str] = &["tags", "ia_tags.tags"];

/// Canonical product shape handed to handlers and views.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_new: bool,
}

impl NormalizedProduct {
    pub fn from_document(doc: &Document) -> Self {
        let id = match lookup(doc, "id").filter(|v| is_present(v)) {
            Some(value) => scalar_to_string(value).unwrap_or_default(),
            None => doc.get("_id").and_then(scalar_to_string).unwrap_or_default(),
        };

        let name = first_present(doc, NAME_KEYS)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| UNTITLED_PRODUCT.to_string());

        let description = first_present(doc, DESCRIPTION_KEYS)
            .and_then(scalar_to_string)
            .unwrap_or_default();

        let price = first_present(doc, PRICE_KEYS).map(coerce_price).unwrap_or(0.0);

        let image = first_leaf(doc, IMAGE_KEYS)
            .and_then(scalar_to_string)
            .filter(|s| !s.trim().is_empty());

        let images = first_leaf(doc, GALLERY_KEYS)
            .map(coerce_string_list)
            .unwrap_or_default();

        let tags = coerce_tags(first_present(doc, TAG_KEYS));

        let category = doc
            .get("category")
            .filter(|v| is_present(v))
            .and_then(scalar_to_string);

        let is_new = matches!(doc.get("is_new"), Some(Bson::Boolean(true)));

        NormalizedProduct { id, name, description, price, image, images, tags, category, is_new }
    }

    /// Main image, falling back to the first gallery entry.
    pub fn cover(&self) -> Option<&str> {
        self.image
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// Gallery with the main image first and no repeats.
    pub fn gallery(&self) -> Vec<String> {
        let mut gallery = Vec::with_capacity(self.images.len() + 1);
        if let Some(main) = &self.image {
            gallery.push(main.clone());
        }
        for img in &self.images {
            if !gallery.contains(img) {
                gallery.push(img.clone());
            }
        }
        gallery
    }
}

/// Fields an admin submits when creating or editing a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

impl ProductDraft {
    pub fn category(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn cover(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }

    /// Document written on create and used as the `$set` on update.
    /// `category` is kept for readers that predate `tags`.
    pub fn to_document(&self, now: bson::DateTime, created: bool) -> Document {
        let mut document = doc! {
            "name": self.name.trim(),
            "description": self.description.trim(),
            "price": self.price,
            "tags": self.tags.clone(),
            "category": self.category(),
            "image": self.cover(),
            "images": self.images.clone(),
            "updated_at": now,
        };
        if created {
            document.insert("created_at", now);
        }
        document
    }
}

/// Splits a comma separated tag string into trimmed, unique, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    dedupe(raw.split(',').map(str::to_string))
}

/// Keeps only the digits of a price string: `"💰70.000"` becomes `70000`.
pub fn clean_price(raw: &str) -> i64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Formats a price with dot thousands separators and no decimals, e.g. `$70.000`.
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Turns a stored image reference into something a browser can load.
pub fn public_image_url(raw: &str) -> String {
    if raw.starts_with("http") || raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("{}{}", UPLOADS_URL_PREFIX, raw)
    }
}

/// Coerces whatever is stored under a tags key into a list of tags.
pub fn coerce_tags(value: Option<&Bson>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(value) => dedupe(coerce_string_list(value)),
    }
}

fn coerce_string_list(value: &Bson) -> Vec<String> {
    let items: Vec<String> = match value {
        Bson::Null | Bson::Undefined => Vec::new(),
        Bson::String(s) => s.split(',').map(str::to_string).collect(),
        Bson::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn coerce_price(value: &Bson) -> f64 {
    match value {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(d) if d.is_finite() => *d,
        Bson::String(s) => clean_price(s) as f64,
        _ => 0.0,
    }
}

fn dedupe(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn scalar_to_string(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => Some(s.clone()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::Int32(i) => Some(i.to_string()),
        Bson::Int64(i) => Some(i.to_string()),
        Bson::Double(d) => Some(d.to_string()),
        Bson::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Missing, null, empty and zero values all count as "not set" when walking a
/// fallback chain.
fn is_present(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => false,
        Bson::String(s) => !s.is_empty(),
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(d) => *d != 0.0,
        Bson::Boolean(b) => *b,
        Bson::Array(items) => !items.is_empty(),
        Bson::Document(d) => !d.is_empty(),
        _ => true,
    }
}

/// Dotted-path lookup: `"imagenes.portada"` only resolves when `imagenes` is a document.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn first_present<'a>(doc: &'a Document, keys: &[&str]) -> Option<&'a Bson> {
    keys.iter()
        .filter_map(|key| lookup(doc, key))
        .find(|value| is_present(value))
}

/// Like [`first_present`] but steps past sub-documents, so `images` can be
/// either a list or a `{cover, all}` document.
fn first_leaf<'a>(doc: &'a Document, keys: &[&str]) -> Option<&'a Bson> {
    keys.iter()
        .filter_map(|key| lookup(doc, key))
        .find(|value| is_present(value) && !matches!(value, Bson::Document(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn test_canonical_document() {
        let oid = ObjectId::new();
        let doc = doc! {
            "_id": oid,
            "name": "Sandalias",
            "description": "Cuero",
            "price": 45000_i64,
            "image": "/static/uploads/a.jpg",
            "images": ["/static/uploads/a.jpg", "/static/uploads/b.jpg"],
            "tags": ["verano", "cuero"],
            "category": "verano",
        };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.id, oid.to_hex());
        assert_eq!(product.name, "Sandalias");
        assert_eq!(product.price, 45000.0);
        assert_eq!(product.tags, vec!["verano", "cuero"]);
        assert_eq!(product.category.as_deref(), Some("verano"));
    }

    #[test]
    fn test_legacy_keys() {
        let doc = doc! {
            "titulo": "Bolso",
            "descripcion": "Bolso de mano",
            "precio": "💰70.000",
            "imagenes": { "portada": "cover.jpg", "lista_completa": ["cover.jpg", "side.jpg"] },
        };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.name, "Bolso");
        assert_eq!(product.description, "Bolso de mano");
        assert_eq!(product.price, 70000.0);
        assert_eq!(product.image.as_deref(), Some("cover.jpg"));
        assert_eq!(product.images, vec!["cover.jpg", "side.jpg"]);
    }

    #[test]
    fn test_empty_values_fall_through() {
        let doc = doc! { "name": "", "nombre": "Gorra", "price": 0, "precio": 1200 };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.name, "Gorra");
        assert_eq!(product.price, 1200.0);
    }

    #[test]
    fn test_sparse_document_gets_defaults() {
        let product = NormalizedProduct::from_document(&Document::new());
        assert_eq!(product.name, UNTITLED_PRODUCT);
        assert_eq!(product.description, "");
        assert_eq!(product.price, 0.0);
        assert!(product.image.is_none());
        assert!(product.images.is_empty());
        assert!(product.tags.is_empty());
    }

    #[test]
    fn test_tags_from_string_are_split_and_deduplicated() {
        let doc = doc! { "tags": "shoes, summer,, sale ,shoes" };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.tags, vec!["shoes", "summer", "sale"]);
    }

    #[test]
    fn test_tags_from_list_are_deduplicated() {
        let doc = doc! { "tags": ["a", " a", "b", Bson::Null, 7] };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.tags, vec!["a", "b", "7"]);
    }

    #[test]
    fn test_scalar_tag_becomes_list() {
        let doc = doc! { "tags": 2024 };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.tags, vec!["2024"]);
    }

    #[test]
    fn test_tags_fall_back_to_generated_tags() {
        let doc = doc! { "tags": [], "ia_tags": { "status": "DONE", "tags": ["NUEVA COLECCIÓN"] } };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.tags, vec!["NUEVA COLECCIÓN"]);
    }

    #[test]
    fn test_string_id_field_wins() {
        let doc = doc! { "_id": ObjectId::new(), "id": "legacy-42" };
        assert_eq!(NormalizedProduct::from_document(&doc).id, "legacy-42");
    }

    #[test]
    fn test_images_document_from_loader() {
        let product = NormalizedProduct::from_document(&doc! {
            "name": "X",
            "images": { "all": ["a.jpg", "b.jpg"], "cover": "a.jpg", "count": 2 },
        });
        assert_eq!(product.image.as_deref(), Some("a.jpg"));
        assert_eq!(product.images, vec!["a.jpg", "b.jpg"]);

        let product = NormalizedProduct::from_document(&doc! {
            "images": { "all": ["c.jpg"], "count": 1 },
        });
        assert_eq!(product.image, None);
        assert_eq!(product.cover(), Some("c.jpg"));
    }

    #[test]
    fn test_imagenes_as_plain_list() {
        let doc = doc! { "imagenes": ["a.jpg", "b.jpg"] };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(product.cover(), Some("a.jpg"));
    }

    #[test]
    fn test_gallery_puts_main_image_first() {
        let doc = doc! { "image": "b.jpg", "images": ["a.jpg", "b.jpg"] };
        let product = NormalizedProduct::from_document(&doc);
        assert_eq!(product.gallery(), vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_price("💰70.000"), 70000);
        assert_eq!(clean_price("$1,250"), 1250);
        assert_eq!(clean_price("free"), 0);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(70000.0), "$70.000");
        assert_eq!(format_price(999.0), "$999");
        assert_eq!(format_price(1234567.0), "$1.234.567");
        assert_eq!(format_price(0.0), "$0");
    }

    #[test]
    fn test_public_image_url() {
        assert_eq!(public_image_url("a.jpg"), "/static/uploads/a.jpg");
        assert_eq!(public_image_url("/static/x.png"), "/static/x.png");
        assert_eq!(public_image_url("https://cdn/x.png"), "https://cdn/x.png");
    }

    #[test]
    fn test_draft_document() {
        let draft = ProductDraft {
            name: " Gorra ".into(),
            description: "Roja".into(),
            price: 1200,
            tags: vec![],
            images: vec!["/static/uploads/1.jpg".into()],
        };
        let now = bson::DateTime::now();
        let created = draft.to_document(now, true);
        assert_eq!(created.get_str("name").unwrap(), "Gorra");
        assert_eq!(created.get_str("category").unwrap(), DEFAULT_CATEGORY);
        assert_eq!(created.get_str("image").unwrap(), "/static/uploads/1.jpg");
        assert!(created.contains_key("created_at"));
        assert!(!draft.to_document(now, false).contains_key("created_at"));
    }
}

// ABOUTME: Typed input schemas for every writable entity and for the API request bodies
// ABOUTME: Each schema parses an untyped JSON value, applying defaults and dropping unknown keys

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::image::{AnalysisStatus, ImageType};
use crate::metadata::{AnalysisResult, BoundingBox, ItemAttribute};
use crate::validation::{Schema, ValidationErrors, Validator, ViolationKind};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Schema for RegisterInput {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let name = v.string("name").max_len(MAX_NAME_LEN).take();
        let email = v.string("email").required().email().take();
        let password = v
            .string("password")
            .required()
            .min_len(MIN_PASSWORD_LEN, "Password must be at least 8 characters")
            .take();
        let confirm = v.string("password_confirm").required().take();

        if let (Some(password), Some(confirm)) = (&password, &confirm) {
            v.check(
                password == confirm,
                "password_confirm",
                ViolationKind::Mismatch,
                "Passwords do not match",
            );
        }

        v.finish()?;
        Ok(Self {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default().to_lowercase(),
            password: password.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Schema for LoginInput {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let email = v.string("email").required().email().take();
        let password = v
            .string("password")
            .required()
            .min_len(1, "Password is required")
            .take();

        v.finish()?;
        Ok(Self {
            email: email.unwrap_or_default().to_lowercase(),
            password: password.unwrap_or_default(),
        })
    }
}

/// Raw file as received from a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ImageInput {
    pub upload: ImageUpload,
    pub image_type: ImageType,
    pub analysis_status: AnalysisStatus,
}

impl ImageInput {
    /// Files arrive outside the JSON body, so the upload is checked here directly.
    pub fn new(upload: ImageUpload, image_type: Option<ImageType>) -> Result<Self, ValidationErrors> {
        if upload.bytes.is_empty() {
            return Err(ValidationErrors::single(
                "file",
                ViolationKind::Required,
                "File is required",
            ));
        }

        if !upload.content_type.starts_with("image/") {
            return Err(ValidationErrors::single(
                "file",
                ViolationKind::InvalidFormat,
                "File must be an image",
            ));
        }

        Ok(Self {
            upload,
            image_type: image_type.unwrap_or(ImageType::Unprocessed),
            analysis_status: AnalysisStatus::Pending,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageUpdate {
    pub image_type: Option<ImageType>,
    pub analysis_status: Option<AnalysisStatus>,
}

impl Schema for ImageUpdate {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let image_type = v.choice("image_type", ImageType::ALLOWED);
        let analysis_status = v.choice("analysis_status", AnalysisStatus::ALLOWED);

        v.finish()?;
        Ok(Self {
            image_type,
            analysis_status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    pub item_label: String,
    pub item_notes: String,
    pub category_functional: String,
    pub category_specific: String,
    pub item_type: String,
    pub item_manufacturer: String,
    pub item_attributes: Vec<ItemAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_image_bbox: Option<BoundingBox>,
}

impl Schema for ItemInput {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let item_label = v
            .string("item_label")
            .required()
            .min_len(1, "Item label is required")
            .take();
        let item_notes = v.string("item_notes").take();
        let category_functional = v
            .string("category_functional")
            .required()
            .min_len(1, "Functional category is required")
            .take();
        let category_specific = v
            .string("category_specific")
            .required()
            .min_len(1, "Specific category is required")
            .take();
        let item_type = v
            .string("item_type")
            .required()
            .min_len(1, "Item type is required")
            .take();
        let item_manufacturer = v.string("item_manufacturer").take();
        let item_attributes = v.structured("item_attributes", "a list of {name, value}");
        let container = v.string("container").take();
        let primary_image = v.string("primary_image").take();
        let primary_image_bbox = v.structured("primary_image_bbox", "a bounding box");

        v.finish()?;
        Ok(Self {
            item_label: item_label.unwrap_or_default(),
            item_notes: item_notes.unwrap_or_default(),
            category_functional: category_functional.unwrap_or_default(),
            category_specific: category_specific.unwrap_or_default(),
            item_type: item_type.unwrap_or_default(),
            item_manufacturer: item_manufacturer.unwrap_or_default(),
            item_attributes: item_attributes.unwrap_or_default(),
            container: container.filter(|c| !c.is_empty()),
            primary_image: primary_image.filter(|p| !p.is_empty()),
            primary_image_bbox,
        })
    }
}

/// Partial item change. For `container` and `primary_image`, an empty string clears the reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub item_label: Option<String>,
    pub item_notes: Option<String>,
    pub category_functional: Option<String>,
    pub category_specific: Option<String>,
    pub item_type: Option<String>,
    pub item_manufacturer: Option<String>,
    pub item_attributes: Option<Vec<ItemAttribute>>,
    pub container: Option<String>,
    pub primary_image: Option<String>,
    pub primary_image_bbox: Option<BoundingBox>,
}

impl Schema for ItemUpdate {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let update = Self {
            item_label: v
                .string("item_label")
                .min_len(1, "Item label is required")
                .take(),
            item_notes: v.string("item_notes").take(),
            category_functional: v
                .string("category_functional")
                .min_len(1, "Functional category is required")
                .take(),
            category_specific: v
                .string("category_specific")
                .min_len(1, "Specific category is required")
                .take(),
            item_type: v
                .string("item_type")
                .min_len(1, "Item type is required")
                .take(),
            item_manufacturer: v.string("item_manufacturer").take(),
            item_attributes: v.structured("item_attributes", "a list of {name, value}"),
            container: v.string("container").take(),
            primary_image: v.string("primary_image").take(),
            primary_image_bbox: v.structured("primary_image_bbox", "a bounding box"),
        };

        v.finish()?;
        Ok(update)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerInput {
    pub container_label: String,
    pub container_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_image_bbox: Option<BoundingBox>,
}

impl Schema for ContainerInput {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let container_label = v
            .string("container_label")
            .required()
            .min_len(1, "Container label is required")
            .take();
        let container_notes = v.string("container_notes").take();
        let primary_image = v.string("primary_image").take();
        let primary_image_bbox = v.structured("primary_image_bbox", "a bounding box");

        v.finish()?;
        Ok(Self {
            container_label: container_label.unwrap_or_default(),
            container_notes: container_notes.unwrap_or_default(),
            primary_image: primary_image.filter(|p| !p.is_empty()),
            primary_image_bbox,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerUpdate {
    pub container_label: Option<String>,
    pub container_notes: Option<String>,
    pub primary_image: Option<String>,
    pub primary_image_bbox: Option<BoundingBox>,
}

impl Schema for ContainerUpdate {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let update = Self {
            container_label: v
                .string("container_label")
                .min_len(1, "Container label is required")
                .take(),
            container_notes: v.string("container_notes").take(),
            primary_image: v.string("primary_image").take(),
            primary_image_bbox: v.structured("primary_image_bbox", "a bounding box"),
        };

        v.finish()?;
        Ok(update)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadataInput {
    pub file_hash: String,
    pub metadata: AnalysisResult,
    pub version: i32,
    pub image_type: ImageType,
}

impl Schema for ImageMetadataInput {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let file_hash = v
            .string("file_hash")
            .required()
            .min_len(1, "File hash is required")
            .take();
        let metadata = v.structured::<AnalysisResult>("metadata", "an analysis result");
        if !v.is_present("metadata") {
            v.missing("metadata");
        }
        let version = v.integer("version");
        let image_type = v.choice("image_type", ImageType::ALLOWED);

        v.finish()?;
        let (Some(file_hash), Some(metadata)) = (file_hash, metadata) else {
            return Err(ValidationErrors::single(
                "",
                ViolationKind::Required,
                "File hash and metadata are required",
            ));
        };

        Ok(Self {
            file_hash,
            metadata,
            version: version.and_then(|n| i32::try_from(n).ok()).unwrap_or(1),
            image_type: image_type.unwrap_or(ImageType::Unprocessed),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelTarget {
    Item,
    Container,
}

impl LabelTarget {
    pub const ALLOWED: &'static [&'static str] = &["item", "container"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelTarget::Item => "item",
            LabelTarget::Container => "container",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelInput {
    pub item_id: Option<String>,
    pub container_id: Option<String>,
    pub format: String,
    pub data: Option<Value>,
}

impl Schema for LabelInput {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let item_id = v.string("item_id").take().filter(|s| !s.is_empty());
        let container_id = v.string("container_id").take().filter(|s| !s.is_empty());
        let format = v
            .string("format")
            .required()
            .min_len(1, "Format is required")
            .take();
        let data = v.structured::<Value>("data", "a JSON value");

        v.check(
            item_id.is_some() != container_id.is_some(),
            "item_id",
            ViolationKind::Required,
            "Exactly one of item_id or container_id is required",
        );

        v.finish()?;
        Ok(Self {
            item_id,
            container_id,
            format: format.unwrap_or_default(),
            data,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeImageRequest {
    pub image_id: String,
}

impl Schema for AnalyzeImageRequest {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let image_id = v
            .string("imageId")
            .required()
            .min_len(1, "No imageId provided")
            .take();

        v.finish()?;
        Ok(Self {
            image_id: image_id.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateLabelRequest {
    pub target_id: String,
    pub target_type: LabelTarget,
    pub format: String,
}

impl Schema for GenerateLabelRequest {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new(input)?;

        let target_id = v
            .string("targetId")
            .required()
            .min_len(1, "targetId is required")
            .take();
        let target_type = v.choice::<LabelTarget>("targetType", LabelTarget::ALLOWED);
        if !v.is_present("targetType") {
            v.missing("targetType");
        }
        let format = v
            .string("format")
            .required()
            .min_len(1, "format is required")
            .take();

        v.finish()?;
        match (target_id, target_type, format) {
            (Some(target_id), Some(target_type), Some(format)) => Ok(Self {
                target_id,
                target_type,
                format,
            }),
            _ => Err(ValidationErrors::single(
                "",
                ViolationKind::Required,
                "targetId, targetType and format are required",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_register_rejects_malformed_payload() {
        let errors = validate::<RegisterInput>(&json!({
            "email": "invalid-email",
            "password": "x",
            "password_confirm": "x",
        }))
        .unwrap_err();

        assert_eq!(errors.kind_of("email"), Some(ViolationKind::InvalidFormat));
        assert_eq!(errors.kind_of("password"), Some(ViolationKind::TooShort));
    }

    #[test]
    fn test_register_accepts_well_formed_payload() {
        let input = validate::<RegisterInput>(&json!({
            "name": "Sam",
            "email": "Sam@Example.com",
            "password": "correct horse",
            "password_confirm": "correct horse",
            "role": "admin",
        }))
        .unwrap();

        assert_eq!(input.email, "sam@example.com");
        assert_eq!(input.name, "Sam");
    }

    #[test]
    fn test_register_flags_mismatched_confirmation() {
        let errors = validate::<RegisterInput>(&json!({
            "email": "sam@example.com",
            "password": "password-one",
            "password_confirm": "password-two",
        }))
        .unwrap_err();

        assert_eq!(errors.violations().len(), 1);
        assert_eq!(errors.kind_of("password_confirm"), Some(ViolationKind::Mismatch));
    }

    #[test]
    fn test_item_input_applies_defaults() {
        let input = validate::<ItemInput>(&json!({
            "item_label": "Cordless drill",
            "category_functional": "Tools",
            "category_specific": "Power Tools",
            "item_type": "Drill",
            "unknown": true,
        }))
        .unwrap();

        assert_eq!(input.item_notes, "");
        assert_eq!(input.item_manufacturer, "");
        assert!(input.item_attributes.is_empty());
        assert_eq!(input.container, None);
    }

    #[test]
    fn test_item_input_reports_every_missing_category() {
        let errors = validate::<ItemInput>(&json!({
            "item_label": "",
            "item_attributes": "not a list",
        }))
        .unwrap_err();

        assert_eq!(errors.kind_of("item_label"), Some(ViolationKind::TooShort));
        assert_eq!(errors.kind_of("category_functional"), Some(ViolationKind::Required));
        assert_eq!(errors.kind_of("category_specific"), Some(ViolationKind::Required));
        assert_eq!(errors.kind_of("item_type"), Some(ViolationKind::Required));
        assert_eq!(errors.kind_of("item_attributes"), Some(ViolationKind::InvalidType));
    }

    #[test]
    fn test_image_update_rejects_unknown_status() {
        let errors = validate::<ImageUpdate>(&json!({ "analysis_status": "done" })).unwrap_err();
        assert_eq!(errors.kind_of("analysis_status"), Some(ViolationKind::InvalidEnum));

        let update = validate::<ImageUpdate>(&json!({ "image_type": "container" })).unwrap();
        assert_eq!(update.image_type, Some(ImageType::Container));
        assert_eq!(update.analysis_status, None);
    }

    #[test]
    fn test_image_input_requires_image_content() {
        let upload = ImageUpload {
            file_name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: b"hello".to_vec(),
        };
        let errors = ImageInput::new(upload, None).unwrap_err();
        assert_eq!(errors.kind_of("file"), Some(ViolationKind::InvalidFormat));

        let empty = ImageUpload {
            file_name: "empty.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Vec::new(),
        };
        let errors = ImageInput::new(empty, None).unwrap_err();
        assert_eq!(errors.kind_of("file"), Some(ViolationKind::Required));
    }

    #[test]
    fn test_label_request_validates_target_type() {
        let errors = validate::<GenerateLabelRequest>(&json!({
            "targetId": "abc",
            "targetType": "shelf",
            "format": "qr-only",
        }))
        .unwrap_err();
        assert_eq!(errors.kind_of("targetType"), Some(ViolationKind::InvalidEnum));

        let request = validate::<GenerateLabelRequest>(&json!({
            "targetId": "abc",
            "targetType": "container",
            "format": "qr-only",
        }))
        .unwrap();
        assert_eq!(request.target_type, LabelTarget::Container);
    }

    #[test]
    fn test_label_input_requires_exactly_one_target() {
        let errors = validate::<LabelInput>(&json!({
            "item_id": "a",
            "container_id": "b",
            "format": "qr-only",
        }))
        .unwrap_err();
        assert_eq!(errors.kind_of("item_id"), Some(ViolationKind::Required));
    }

    #[test]
    fn test_image_metadata_defaults_version_and_type() {
        let input = validate::<ImageMetadataInput>(&json!({
            "file_hash": "abc123",
            "metadata": {
                "type": "item",
                "data": { "item": { "item_label": "Arduino Uno" } }
            }
        }))
        .unwrap();

        assert_eq!(input.version, 1);
        assert_eq!(input.image_type, ImageType::Unprocessed);
    }
}

use std::path::Path;

use uuid::Uuid;

use crate::error::{Result, YatraError};
use crate::types::{ArtisanProfile, ContactInfo, Product};

#[derive(Default, Debug, Clone)]
pub struct ArtisanForm {
    pub user_id: String,
    pub display_name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub skills: String,
    pub story: String,
    pub contact_phone: String,
    pub contact_email: String,
}

impl ArtisanForm {
    pub fn validate(self) -> Result<ArtisanProfile> {
        let artisan_id = required(&self.user_id, "user id")?;
        let lat = unset_if_zero(self.lat);
        let lon = unset_if_zero(self.lon);
        if lat.is_some_and(|v| !(-90.0..=90.0).contains(&v)) {
            return Err(YatraError::invalid(format!("latitude {} is out of range", self.lat)));
        }
        if lon.is_some_and(|v| !(-180.0..=180.0).contains(&v)) {
            return Err(YatraError::invalid(format!("longitude {} is out of range", self.lon)));
        }
        Ok(ArtisanProfile {
            artisan_id,
            display_name: self.display_name.trim().to_string(),
            address: self.address.trim().to_string(),
            lat,
            lon,
            skills: split_skills(&self.skills),
            story: self.story,
            contact_info: ContactInfo {
                phone: self.contact_phone.trim().to_string(),
                email: self.contact_email.trim().to_string(),
            },
        })
    }
}

#[derive(Default, Debug, Clone)]
pub struct ProductForm {
    pub artisan_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
}

impl ProductForm {
    /// The product without images; the uploaded image URL is attached later
    pub fn validate(self) -> Result<Product> {
        let artisan_id = required(&self.artisan_id, "artisan id")?;
        let title = required(&self.title, "title")?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(YatraError::invalid(format!("price {} must be zero or more", self.price)));
        }
        Ok(Product {
            artisan_id,
            title,
            description: self.description,
            category: self.category.trim().to_string(),
            price: unset_if_zero(self.price),
            stock: self.stock,
            images: Vec::new(),
        })
    }
}

/// A validated image ready to upload to the product bucket
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub object_path: String,
    pub content_type: &'static str,
}

impl ImageUpload {
    pub fn for_file(artisan_id: &str, file: &Path) -> Result<Self> {
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                YatraError::invalid(format!("{} has no file extension", file.display()))
            })?;
        let content_type = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            other => {
                return Err(YatraError::invalid(format!(
                    "unsupported image type .{other}, use jpg, jpeg or png"
                )))
            }
        };
        Ok(ImageUpload {
            object_path: format!("{}/{}.{}", artisan_id, Uuid::new_v4().simple(), ext),
            content_type,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(YatraError::invalid(format!("{field} is required")));
    }
    Ok(value.to_string())
}

// the forms use 0 for "not given"
fn unset_if_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artisan() -> ArtisanForm {
        ArtisanForm {
            user_id: " u-42 ".to_string(),
            display_name: "Sohrai Arts".to_string(),
            skills: "dokra, sohrai painting,, ".to_string(),
            lat: 23.36,
            ..Default::default()
        }
    }

    #[test]
    fn artisan_form_normalizes_fields() {
        let profile = artisan().validate().unwrap();
        assert_eq!(profile.artisan_id, "u-42");
        assert_eq!(profile.skills, vec!["dokra", "sohrai painting"]);
        assert_eq!(profile.lat, Some(23.36));
        assert_eq!(profile.lon, None);
    }

    #[test]
    fn artisan_form_requires_user_id() {
        let form = ArtisanForm {
            user_id: "   ".to_string(),
            ..artisan()
        };
        assert!(matches!(form.validate(), Err(YatraError::InvalidInput(_))));
    }

    #[test]
    fn artisan_form_rejects_bad_latitude() {
        let form = ArtisanForm { lat: 123.0, ..artisan() };
        assert!(form.validate().is_err());
    }

    #[test]
    fn product_form_requires_artisan_and_title() {
        let missing_title = ProductForm {
            artisan_id: "u-42".to_string(),
            ..Default::default()
        };
        assert!(missing_title.validate().is_err());
        let missing_artisan = ProductForm {
            title: "Dokra horse".to_string(),
            ..Default::default()
        };
        assert!(missing_artisan.validate().is_err());
    }

    #[test]
    fn product_form_price_rules() {
        let form = ProductForm {
            artisan_id: "u-42".to_string(),
            title: "Dokra horse".to_string(),
            price: 0.0,
            stock: 3,
            ..Default::default()
        };
        let product = form.clone().validate().unwrap();
        assert_eq!(product.price, None);
        assert_eq!(product.stock, 3);
        assert!(ProductForm { price: -1.0, ..form.clone() }.validate().is_err());
        assert!(ProductForm { price: f64::NAN, ..form.clone() }.validate().is_err());
        assert_eq!(ProductForm { price: 450.5, ..form }.validate().unwrap().price, Some(450.5));
    }

    #[test]
    fn image_upload_paths_and_types() {
        let upload = ImageUpload::for_file("u-42", Path::new("/tmp/horse.JPG")).unwrap();
        assert_eq!(upload.content_type, "image/jpeg");
        assert!(upload.object_path.starts_with("u-42/"));
        assert!(upload.object_path.ends_with(".jpg"));
        // u-42/ + 32 hex chars + .jpg
        assert_eq!(upload.object_path.len(), 5 + 32 + 4);

        let png = ImageUpload::for_file("u-42", Path::new("mask.png")).unwrap();
        assert_eq!(png.content_type, "image/png");

        assert!(ImageUpload::for_file("u-42", Path::new("notes.gif")).is_err());
        assert!(ImageUpload::for_file("u-42", Path::new("README")).is_err());
    }
}

//! Toy listings and their comments

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rating::Rating;
use crate::validate::{self, Validator};

/// Lowest price a listing may carry, in tenge
pub const MIN_TOY_VALUE: i64 = 1000;

/// Highest price a listing may carry, in tenge
pub const MAX_TOY_VALUE: i64 = 150_000;

/// A catalog listing
///
/// Toys mutate through the store's version-matched update path; `version`
/// starts at 1 on insert and is bumped on every successful write.
#[derive(Debug, Clone, Serialize)]
pub struct Toy {
    /// Unique toy ID
    pub id: i64,

    /// When the listing was created
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,

    /// Listing title
    pub title: String,

    /// Free-form description
    #[serde(rename = "desc")]
    pub description: String,

    /// Bullet-point details, at most five
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,

    /// Skills the toy develops
    pub skills: Vec<String>,

    /// Image URLs
    #[serde(rename = "image")]
    pub images: Vec<String>,

    /// Catalog categories
    pub categories: Vec<String>,

    /// Recommended age range, e.g. `"3-5"`
    pub recommended_age: String,

    /// Manufacturer name
    pub manufacturer: String,

    /// Price in tenge
    pub value: i64,

    /// Whether the toy is currently in stock
    #[serde(rename = "isAvailable")]
    pub is_available: bool,

    /// Users waiting for the toy to come back in stock
    #[serde(rename = "waitList", skip_serializing_if = "Vec::is_empty")]
    pub wait_list: Vec<String>,

    /// Optimistic-concurrency counter; never serialized
    #[serde(skip_serializing)]
    pub version: i64,
}

impl Toy {
    /// Run the listing-level validation checks
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.title.is_empty(), "title", "must be provided");
        v.check(
            self.title.len() <= 500,
            "title",
            "must not be more than 500 bytes long",
        );
        v.check(
            self.description.len() <= 5000,
            "desc",
            "must not be more than 5000 bytes long",
        );
        v.check(
            self.details.len() <= 5,
            "details",
            "must not be more than 5",
        );
        v.check(
            self.images.iter().all(|url| is_image_url(url)),
            "image",
            "some of the image urls are wrong",
        );
        v.check(!self.categories.is_empty(), "categories", "at least 1 category");
        v.check(!self.skills.is_empty(), "skills", "at least 1 skill");
        v.check(
            self.categories.len() <= 7,
            "categories",
            "no more than 7 categories",
        );
        v.check(self.skills.len() <= 7, "skills", "no more than 7 skills");
        v.check(
            validate::unique(&self.categories),
            "categories",
            "must not contain duplicate values",
        );
        v.check(
            validate::unique(&self.skills),
            "skills",
            "must not contain duplicate values",
        );
        v.check(!self.recommended_age.is_empty(), "recAge", "must be provided");
        v.check(
            !self.manufacturer.is_empty(),
            "manufacturer",
            "must be provided",
        );
        v.check(
            self.value >= MIN_TOY_VALUE,
            "value",
            "must be at least 1000 tenge",
        );
        v.check(
            self.value <= MAX_TOY_VALUE,
            "value",
            "must not be more than 150000 tenge",
        );
    }
}

fn is_image_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// A comment left on a toy, insert/read only
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    /// Unique comment ID
    pub id: i64,

    /// When the comment was created
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,

    /// The commented toy
    pub toy_id: i64,

    /// Display name of the commenting user
    pub user_name: String,

    /// Comment body
    pub text: String,

    /// Rating, rendered as `"<n> из 5"`
    pub rating: Rating,
}

impl Comment {
    /// Run the comment-level validation checks
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.text.is_empty(), "text", "must be provided");
        v.check(
            self.text.len() <= 1000,
            "text",
            "must not be more than 1000 bytes long",
        );
    }
}

/// Sort keys accepted by the toy listing endpoint
const SORT_SAFELIST: &[&str] = &["id", "title", "value", "-id", "-title", "-value"];

/// Filtering, sorting and pagination inputs for the toy listing
#[derive(Debug, Clone)]
pub struct ToyFilter {
    /// Full-text match against the title; empty matches everything
    pub title: String,

    /// Required skills; empty matches everything
    pub skills: Vec<String>,

    /// Required categories; empty matches everything
    pub categories: Vec<String>,

    /// Lower price bound in tenge
    pub value_from: i64,

    /// Upper price bound in tenge
    pub value_to: i64,

    /// 1-based page number
    pub page: i64,

    /// Records per page
    pub page_size: i64,

    /// Sort key, optionally prefixed with `-` for descending order
    pub sort: String,
}

impl Default for ToyFilter {
    fn default() -> Self {
        Self {
            title: String::new(),
            skills: Vec::new(),
            categories: Vec::new(),
            value_from: MIN_TOY_VALUE,
            value_to: MAX_TOY_VALUE,
            page: 1,
            page_size: 20,
            sort: "id".to_string(),
        }
    }
}

impl ToyFilter {
    /// Run the filter-level validation checks
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(
            self.page <= 10_000_000,
            "page",
            "must be a maximum of 10 million",
        );
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= 100,
            "page_size",
            "must be a maximum of 100",
        );
        v.check(
            SORT_SAFELIST.contains(&self.sort.as_str()),
            "sort",
            "invalid sort value",
        );
    }

    /// The safelisted column name for ORDER BY
    ///
    /// Panics on a sort value that was not validated first; the safelist is
    /// what keeps the interpolated ORDER BY clause safe.
    pub fn sort_column(&self) -> &str {
        let column = self.sort.trim_start_matches('-');
        for safe in SORT_SAFELIST {
            if column == safe.trim_start_matches('-') {
                return column;
            }
        }
        panic!("unsafe sort value: {}", self.sort);
    }

    /// `DESC` when the sort key carries a `-` prefix, `ASC` otherwise
    pub fn sort_direction(&self) -> &'static str {
        if self.sort.starts_with('-') {
            "DESC"
        } else {
            "ASC"
        }
    }

    /// LIMIT value for the page
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// OFFSET value for the page
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Pagination metadata returned alongside listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl PageMetadata {
    /// Derive metadata for a result set; zeroed when there are no records
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 {
            return Self::default();
        }

        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_toy() -> Toy {
        Toy {
            id: 0,
            created_at: Utc::now(),
            title: "Wooden blocks".to_string(),
            description: "A set of 50 painted blocks".to_string(),
            details: vec!["50 pieces".to_string()],
            skills: vec!["motor".to_string(), "spatial".to_string()],
            images: vec!["https://cdn.example.com/blocks.jpg".to_string()],
            categories: vec!["construction".to_string()],
            recommended_age: "3-5".to_string(),
            manufacturer: "OyuncaqCo".to_string(),
            value: 4500,
            is_available: true,
            wait_list: Vec::new(),
            version: 1,
        }
    }

    // Test 1: A well-formed toy passes validation
    #[test]
    fn test_valid_toy_passes() {
        let mut v = Validator::new();
        valid_toy().validate(&mut v);
        assert!(v.is_valid());
    }

    // Test 2: Price bounds are enforced
    #[test]
    fn test_toy_value_bounds() {
        let mut toy = valid_toy();
        toy.value = 999;
        let mut v = Validator::new();
        toy.validate(&mut v);
        assert!(!v.is_valid());

        toy.value = MAX_TOY_VALUE + 1;
        let mut v = Validator::new();
        toy.validate(&mut v);
        assert!(!v.is_valid());
    }

    // Test 3: Categories and skills must be present, bounded and distinct
    #[test]
    fn test_toy_category_and_skill_rules() {
        let mut toy = valid_toy();
        toy.categories.clear();
        let mut v = Validator::new();
        toy.validate(&mut v);
        assert!(v.into_errors().contains_key("categories"));

        let mut toy = valid_toy();
        toy.skills = vec!["motor".to_string(), "motor".to_string()];
        let mut v = Validator::new();
        toy.validate(&mut v);
        assert!(v.into_errors().contains_key("skills"));
    }

    // Test 4: Non-HTTP image URLs are rejected
    #[test]
    fn test_toy_image_urls() {
        let mut toy = valid_toy();
        toy.images = vec!["ftp://example.com/pic.png".to_string()];
        let mut v = Validator::new();
        toy.validate(&mut v);
        assert!(v.into_errors().contains_key("image"));
    }

    // Test 5: Toy serialization uses the wire field names
    #[test]
    fn test_toy_serialization_names() {
        let json = serde_json::to_value(valid_toy()).unwrap();
        assert!(json.get("desc").is_some());
        assert!(json.get("image").is_some());
        assert!(json.get("isAvailable").is_some());
        assert!(json.get("version").is_none());
        assert!(json.get("created_at").is_none());
        // Empty wait list is omitted entirely
        assert!(json.get("waitList").is_none());
    }

    // Test 6: Comment text bounds
    #[test]
    fn test_comment_validation() {
        let comment = Comment {
            id: 0,
            created_at: Utc::now(),
            toy_id: 1,
            user_name: "Aruzhan".to_string(),
            text: "x".repeat(1001),
            rating: Rating::new(4),
        };

        let mut v = Validator::new();
        comment.validate(&mut v);
        assert!(!v.is_valid());
    }

    // Test 7: Filter validation bounds page, page_size and sort
    #[test]
    fn test_filter_validation() {
        let mut filter = ToyFilter::default();
        let mut v = Validator::new();
        filter.validate(&mut v);
        assert!(v.is_valid());

        filter.page = 0;
        filter.page_size = 101;
        filter.sort = "price; DROP TABLE toys".to_string();
        let mut v = Validator::new();
        filter.validate(&mut v);
        let errors = v.into_errors();
        assert!(errors.contains_key("page"));
        assert!(errors.contains_key("page_size"));
        assert!(errors.contains_key("sort"));
    }

    // Test 8: Sort helpers strip the direction prefix
    #[test]
    fn test_filter_sort_helpers() {
        let mut filter = ToyFilter::default();
        filter.sort = "-value".to_string();

        assert_eq!(filter.sort_column(), "value");
        assert_eq!(filter.sort_direction(), "DESC");

        filter.sort = "title".to_string();
        assert_eq!(filter.sort_column(), "title");
        assert_eq!(filter.sort_direction(), "ASC");
    }

    // Test 9: Pagination metadata arithmetic
    #[test]
    fn test_page_metadata() {
        let meta = PageMetadata::calculate(45, 2, 20);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.first_page, 1);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.total_records, 45);

        assert_eq!(PageMetadata::calculate(0, 1, 20), PageMetadata::default());
    }

    // Test 10: Offset arithmetic
    #[test]
    fn test_filter_offset() {
        let mut filter = ToyFilter::default();
        filter.page = 3;
        filter.page_size = 10;
        assert_eq!(filter.limit(), 10);
        assert_eq!(filter.offset(), 20);
    }
}

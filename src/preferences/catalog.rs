//! Known chip values per category with their display labels

use super::{Category, MultiCategory, SingleCategory};

/// A selectable chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn chip(value: &'static str, label: &'static str) -> ChipOption {
    ChipOption { value, label }
}

const CONTENT_TYPES: &[ChipOption] = &[
    chip("headline", "Headline"),
    chip("social", "Social Media"),
    chip("email", "Email"),
    chip("webpage", "Web Page"),
    chip("blog", "Blog Post"),
    chip("description", "Product/Service"),
    chip("about", "About"),
    chip("other", "Other"),
];

const INDUSTRIES: &[ChipOption] = &[
    chip("ecommerce", "E-commerce"),
    chip("social-impact", "Social Impact"),
    chip("sports", "Sports & Fitness"),
    chip("business", "Business"),
];

const GENERATIONS: &[ChipOption] = &[
    chip("boomer", "Boomers ('40s-'60s)"),
    chip("genx", "Gen X ('70s-'80s)"),
    chip("millennial", "Millennials ('90s-'00s)"),
    chip("genz", "Gen Z ('10s-'20s)"),
];

const LENGTHS: &[ChipOption] = &[chip("longer", "Longer"), chip("shorter", "Shorter")];

const SOCIAL_PLATFORMS: &[ChipOption] = &[
    chip("linkedin", "LinkedIn"),
    chip("instagram", "Instagram"),
    chip("x", "X / Twitter"),
    chip("facebook", "Facebook"),
    chip("tiktok", "TikTok"),
];

const POST_COUNTS: &[ChipOption] = &[
    chip("1", "Single post"),
    chip("3", "3 variations"),
    chip("5", "5 variations"),
];

const TONES: &[ChipOption] = &[
    chip("welcoming", "Welcoming"),
    chip("clear", "Clear"),
    chip("gentle", "Gentle"),
    chip("humble", "Humble"),
    chip("enthused", "Enthusiastic"),
    chip("diplomatic", "Diplomatic"),
];

/// Chips offered for a category, in display order
pub fn category_options(category: Category) -> &'static [ChipOption] {
    match category {
        Category::Single(SingleCategory::ContentType) => CONTENT_TYPES,
        Category::Single(SingleCategory::Industry) => INDUSTRIES,
        Category::Single(SingleCategory::Generation) => GENERATIONS,
        Category::Single(SingleCategory::Length) => LENGTHS,
        Category::Single(SingleCategory::SocialPlatform) => SOCIAL_PLATFORMS,
        Category::Single(SingleCategory::PostCount) => POST_COUNTS,
        Category::Multi(MultiCategory::Tone) => TONES,
    }
}

pub(super) fn category_label(category: Category) -> &'static str {
    match category {
        Category::Single(SingleCategory::ContentType) => "Content Type",
        Category::Single(SingleCategory::Industry) => "Industry Vibe",
        Category::Single(SingleCategory::Generation) => "Target Generation",
        Category::Single(SingleCategory::Length) => "Length",
        Category::Single(SingleCategory::SocialPlatform) => "Social Platform",
        Category::Single(SingleCategory::PostCount) => "Post Count",
        Category::Multi(MultiCategory::Tone) => "Personality",
    }
}

/// Whether `value` is one of the catalog chips for `category`
pub fn is_known_value(category: Category, value: &str) -> bool {
    category_options(category).iter().any(|c| c.value == value)
}

//! sea-orm entities for the marketplace schema.

pub mod abuse_report;
pub mod dosage_form;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod product;
pub mod social_media_post;
pub mod social_media_post_product;
pub mod supplier;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    QueryFilter, QuerySelect, RelationTrait, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::social_media_post::{self, Model as PostModel};
use crate::entities::social_media_post_product::{self, Entity as PostProduct};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Template used for every automated catalog post.
pub const DEFAULT_TEMPLATE: i32 = 1;

#[derive(Debug, Clone)]
pub struct CatalogPostRepository {
    base: BaseRepository,
}

impl CatalogPostRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Products already attached to one of the supplier's posts dated `day`.
    pub async fn products_posted_on(
        &self,
        supplier_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Uuid>, ServiceError> {
        PostProduct::find()
            .select_only()
            .column(social_media_post_product::Column::ProductId)
            .join(
                JoinType::InnerJoin,
                social_media_post_product::Relation::Post.def(),
            )
            .filter(social_media_post::Column::SupplierId.eq(supplier_id))
            .filter(social_media_post::Column::PostDate.eq(day))
            .into_tuple::<Uuid>()
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Inserts a published post and its product links.
    pub async fn record_post<C: ConnectionTrait>(
        conn: &C,
        supplier_id: Uuid,
        day: NaiveDate,
        product_ids: &[Uuid],
    ) -> Result<PostModel, ServiceError> {
        let post = social_media_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(supplier_id),
            template_used: Set(DEFAULT_TEMPLATE),
            post_date: Set(day),
            posted: Set(true),
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;

        if !product_ids.is_empty() {
            let links = product_ids
                .iter()
                .map(|product_id| social_media_post_product::ActiveModel {
                    post_id: Set(post.id),
                    product_id: Set(*product_id),
                });
            PostProduct::insert_many(links)
                .exec_without_returning(conn)
                .await
                .map_err(ServiceError::db_error)?;
        }

        Ok(post)
    }
}

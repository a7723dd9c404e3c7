use sqlx::{Executor, QueryBuilder, Result, Sqlite, SqlitePool};

use super::{DescriptorRecord, ImageRecord};

/// 添加图片记录
pub async fn add_image<'c, E>(
    executor: E,
    hash: &[u8],
    path: &str,
    category: &str,
    descriptors: &str,
) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO image (hash, path, category, descriptors)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(hash)
    .bind(path)
    .bind(category)
    .bind(descriptors)
    .fetch_one(executor)
    .await
}

/// 根据 ID 获取图片记录
pub async fn get_image(executor: &SqlitePool, id: i64) -> Result<Option<ImageRecord>> {
    sqlx::query_as::<_, ImageRecord>(
        r#"
        SELECT id, hash, path, category, descriptors, created_at FROM image WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// 根据哈希获取图片记录
pub async fn get_image_by_hash(executor: &SqlitePool, hash: &[u8]) -> Result<Option<ImageRecord>> {
    sqlx::query_as::<_, ImageRecord>(
        r#"
        SELECT id, hash, path, category, descriptors, created_at FROM image WHERE hash = ?
        "#,
    )
    .bind(hash)
    .fetch_optional(executor)
    .await
}

/// 批量获取图片描述符，不存在的 ID 会被忽略
pub async fn get_descriptors_by_ids(
    executor: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<DescriptorRecord>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, path, category, descriptors FROM image WHERE id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id ASC");

    builder.build_query_as::<DescriptorRecord>().fetch_all(executor).await
}

/// 获取全部图片描述符，按 ID 升序
pub async fn get_all_descriptors(executor: &SqlitePool) -> Result<Vec<DescriptorRecord>> {
    sqlx::query_as::<_, DescriptorRecord>(
        r#"
        SELECT id, path, category, descriptors FROM image ORDER BY id ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// 获取最早添加的一张图片的描述符，用于校验新图片的描述符长度
pub async fn get_reference_descriptors(executor: &SqlitePool) -> Result<Option<String>> {
    sqlx::query_scalar(
        r#"
        SELECT descriptors FROM image ORDER BY id ASC LIMIT 1
        "#,
    )
    .fetch_optional(executor)
    .await
}

/// 查询数据库中的图片数量
pub async fn count_images(executor: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM image
        "#,
    )
    .fetch_one(executor)
    .await
}

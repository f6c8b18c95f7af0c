use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

/// Raw stored row. Player columns hold JSON arrays of embedded entries and
/// are only trusted after `repos::groups::decode_group`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub location: String,
    pub description: Option<String>,
    #[sea_orm(column_name = "start_time")]
    pub start_time: OffsetDateTime,
    #[sea_orm(column_name = "end_time")]
    pub end_time: OffsetDateTime,
    #[sea_orm(column_name = "retreat_deadline")]
    pub retreat_deadline: OffsetDateTime,
    #[sea_orm(column_name = "single_limit")]
    pub single_limit: i32,
    #[sea_orm(column_name = "double_limit")]
    pub double_limit: i32,
    pub pin: String,
    #[sea_orm(column_name = "single_players", column_type = "Json")]
    pub single_players: Json,
    #[sea_orm(column_name = "double_players", column_type = "Json")]
    pub double_players: Json,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

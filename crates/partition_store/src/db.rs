use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum RatingColumn {
    UserId,
    ItemId,
    Rating,
}

pub const RATING_COLUMNS: [RatingColumn; 3] = [
    RatingColumn::UserId,
    RatingColumn::ItemId,
    RatingColumn::Rating,
];

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Records::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Records::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Records::Name).string().not_null())
                    .col(ColumnDef::new(Records::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Records::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Records::Notes).text())
                    .col(
                        ColumnDef::new(Records::Attachment)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        // Summary counts records per month.
        manager
            .create_index(
                Index::create()
                    .name("idx-records-date")
                    .table(Records::Table)
                    .col(Records::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-records-date")
                    .table(Records::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Records::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub enum Records {
    Table,
    Id,
    Name,
    Amount,
    Date,
    Notes,
    Attachment,
}

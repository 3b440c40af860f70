use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010004_create_attendance_records"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance_records"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("user_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("date")).date().not_null())
                    .col(ColumnDef::new(Alias::new("kind")).string_len(32).not_null())
                    .col(ColumnDef::new(Alias::new("status")).string_len(32).not_null())
                    .col(ColumnDef::new(Alias::new("context_key")).string_len(96).not_null())
                    .col(ColumnDef::new(Alias::new("schedule_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("session_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("geofence_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("check_in_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("check_out_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("latitude")).double().null())
                    .col(ColumnDef::new(Alias::new("longitude")).double().null())
                    .col(ColumnDef::new(Alias::new("checkout_latitude")).double().null())
                    .col(ColumnDef::new(Alias::new("checkout_longitude")).double().null())
                    .col(ColumnDef::new(Alias::new("notes")).text().null())
                    .col(ColumnDef::new(Alias::new("created_by")).big_integer().null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("updated_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(ColumnDef::new(Alias::new("deleted_at")).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_att_rec_schedule")
                            .from(Alias::new("attendance_records"), Alias::new("schedule_id"))
                            .to(Alias::new("class_schedules"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_att_rec_session")
                            .from(Alias::new("attendance_records"), Alias::new("session_id"))
                            .to(Alias::new("attendance_sessions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_att_rec_geofence")
                            .from(Alias::new("attendance_records"), Alias::new("geofence_id"))
                            .to(Alias::new("geofences"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One live fact per (actor, day, context). Open campus taps share one
        // context key, so this also caps open taps at one per actor per day.
        // Tombstoned rows fall outside the index.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS ux_att_rec_actor_day_context \
                 ON attendance_records (user_id, date, context_key) \
                 WHERE deleted_at IS NULL",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_att_rec_schedule")
                    .table(Alias::new("attendance_records"))
                    .col(Alias::new("schedule_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("attendance_records")).to_owned())
            .await
    }
}

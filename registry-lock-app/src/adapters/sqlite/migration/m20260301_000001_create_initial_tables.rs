use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Domain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Domain::RepoId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Domain::DomainName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Domain::Tld).string().not_null())
                    .col(
                        ColumnDef::new(Domain::CurrentSponsorRegistrarId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Domain::Statuses)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Domain::DeletionTime).string().null())
                    .col(
                        ColumnDef::new(Domain::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Domain::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Registrar::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registrar::RegistrarId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Registrar::Name).string().not_null())
                    .col(
                        ColumnDef::new(Registrar::RegistryLockAllowed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Registrar::Contacts)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .to_owned(),
            )
            .await?;

        // Revision ids are allocated by SQLite and never reused
        manager
            .create_table(
                Table::create()
                    .table(RegistryLock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegistryLock::RevisionId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RegistryLock::RepoId).string().not_null())
                    .col(ColumnDef::new(RegistryLock::DomainName).string().not_null())
                    .col(ColumnDef::new(RegistryLock::RegistrarId).string().not_null())
                    .col(ColumnDef::new(RegistryLock::RegistrarPocId).string().null())
                    .col(ColumnDef::new(RegistryLock::Action).string().not_null())
                    .col(
                        ColumnDef::new(RegistryLock::IsSuperuser)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RegistryLock::VerificationCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RegistryLock::CreationTime).string().not_null())
                    .col(ColumnDef::new(RegistryLock::CompletionTime).string().null())
                    .col(
                        ColumnDef::new(RegistryLock::RelockDurationMs)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RegistryLock::RelockRevisionId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RegistryLock::RelockProcessedTime)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registry_locks_repo_id")
                    .table(RegistryLock::Table)
                    .col(RegistryLock::RepoId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registry_locks_registrar_id")
                    .table(RegistryLock::Table)
                    .col(RegistryLock::RegistrarId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HistoryEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HistoryEntry::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HistoryEntry::RepoId).string().not_null())
                    .col(ColumnDef::new(HistoryEntry::DomainName).string().not_null())
                    .col(ColumnDef::new(HistoryEntry::RegistrarId).string().not_null())
                    .col(ColumnDef::new(HistoryEntry::HistoryType).string().not_null())
                    .col(
                        ColumnDef::new(HistoryEntry::BySuperuser)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(HistoryEntry::RequestedByRegistrar)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(HistoryEntry::Reason).string().not_null())
                    .col(
                        ColumnDef::new(HistoryEntry::ModificationTime)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BillingEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillingEvent::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillingEvent::Reason).string().not_null())
                    .col(ColumnDef::new(BillingEvent::TargetId).string().not_null())
                    .col(ColumnDef::new(BillingEvent::RegistrarId).string().not_null())
                    .col(ColumnDef::new(BillingEvent::Cost).string().not_null())
                    .col(ColumnDef::new(BillingEvent::EventTime).string().not_null())
                    .col(ColumnDef::new(BillingEvent::BillingTime).string().not_null())
                    .col(ColumnDef::new(BillingEvent::HistoryId).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailOutbox::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailOutbox::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailOutbox::FromAddress).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::Recipients).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::Subject).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::Body).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::QueuedAt).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::SentAt).string().null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailOutbox::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingEvent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HistoryEntry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RegistryLock::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Registrar::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Domain::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Domain {
    #[sea_orm(iden = "domains")]
    Table,
    RepoId,
    DomainName,
    Tld,
    CurrentSponsorRegistrarId,
    Statuses,
    DeletionTime,
    Revision,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Registrar {
    #[sea_orm(iden = "registrars")]
    Table,
    RegistrarId,
    Name,
    RegistryLockAllowed,
    Contacts,
}

#[derive(DeriveIden)]
enum RegistryLock {
    #[sea_orm(iden = "registry_locks")]
    Table,
    RevisionId,
    RepoId,
    DomainName,
    RegistrarId,
    RegistrarPocId,
    Action,
    IsSuperuser,
    VerificationCode,
    CreationTime,
    CompletionTime,
    RelockDurationMs,
    RelockRevisionId,
    RelockProcessedTime,
}

#[derive(DeriveIden)]
enum HistoryEntry {
    #[sea_orm(iden = "history_entries")]
    Table,
    Id,
    RepoId,
    DomainName,
    RegistrarId,
    HistoryType,
    BySuperuser,
    RequestedByRegistrar,
    Reason,
    ModificationTime,
}

#[derive(DeriveIden)]
enum BillingEvent {
    #[sea_orm(iden = "billing_events")]
    Table,
    Id,
    Reason,
    TargetId,
    RegistrarId,
    Cost,
    EventTime,
    BillingTime,
    HistoryId,
}

#[derive(DeriveIden)]
enum EmailOutbox {
    #[sea_orm(iden = "email_outbox")]
    Table,
    Id,
    FromAddress,
    Recipients,
    Subject,
    Body,
    QueuedAt,
    SentAt,
}

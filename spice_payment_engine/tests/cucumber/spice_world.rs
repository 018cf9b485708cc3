use cucumber::World;
use log::*;
use spice_payment_engine::{
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    BankTransaction,
    ConfirmationApi,
    MatchingRules,
    ReconciliationApi,
    ReconciliationSummary,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct SpiceWorld {
    pub system: Option<ReconciliationSystem>,
    pub statement: Vec<BankTransaction>,
    pub last_summary: Option<ReconciliationSummary>,
}

#[derive(Debug)]
pub struct ReconciliationSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub api: ReconciliationApi<SqliteDatabase>,
}

impl SpiceWorld {
    pub fn system(&self) -> &ReconciliationSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn summary(&self) -> &ReconciliationSummary {
        self.last_summary.as_ref().expect("The statement has not been reconciled yet")
    }
}

impl ReconciliationSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let api = ReconciliationApi::new(ConfirmationApi::new(db.clone(), Default::default()), MatchingRules::default());
        Self { db_path: url, db, api }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}

//! The starter categories every user receives.
//!
//! The catalog is defined once here and used both when a user registers and
//! when a user without categories lists them for the first time.

use rusqlite::Connection;

use crate::{
    Error,
    category::{Category, CreateCategoryRequest, create_category, get_categories},
    transaction_type::TransactionType,
    user::{UserID, claim_category_seeding},
};

/// A category in the default catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultCategory {
    /// The display name.
    pub name: &'static str,
    /// A "#RRGGBB" colour.
    pub color: &'static str,
    /// The icon key.
    pub icon: &'static str,
    /// Income or expense.
    pub category_type: TransactionType,
}

const fn expense(name: &'static str, color: &'static str, icon: &'static str) -> DefaultCategory {
    DefaultCategory {
        name,
        color,
        icon,
        category_type: TransactionType::Expense,
    }
}

const fn income(name: &'static str, color: &'static str, icon: &'static str) -> DefaultCategory {
    DefaultCategory {
        name,
        color,
        icon,
        category_type: TransactionType::Income,
    }
}

/// The default catalog: 19 expense categories followed by 2 income categories.
pub const DEFAULT_CATEGORIES: [DefaultCategory; 21] = [
    expense("Taxi", "#f97316", "taxi"),
    expense("Deportes", "#22c55e", "deportes"),
    expense("Entretenimiento", "#8b5cf6", "entretenimiento"),
    expense("Auto", "#3b82f6", "auto"),
    expense("Comida", "#ef4444", "comida"),
    expense("Casa", "#06b6d4", "casa"),
    expense("Facturas", "#64748b", "facturas"),
    expense("Higiene", "#ec4899", "higiene"),
    expense("Restaurante", "#f59e0b", "restaurante"),
    expense("Ropa", "#a855f7", "ropa"),
    expense("Salud", "#10b981", "salud"),
    expense("Transporte", "#0ea5e9", "transporte"),
    expense("Regalos", "#f43f5e", "regalos"),
    expense("Comunicaciones", "#6366f1", "comunicaciones"),
    expense("Suscripciones", "#7c3aed", "suscripciones"),
    expense("Mascotas", "#eab308", "mascotas"),
    expense("Ocio", "#14b8a6", "ocio"),
    expense("Maquillaje", "#f472b6", "maquillaje"),
    expense("Skincare", "#a78bfa", "skincare"),
    income("Salario", "#22c55e", "salario"),
    income("Depósito", "#0ea5e9", "deposito"),
];

impl From<&DefaultCategory> for CreateCategoryRequest {
    fn from(value: &DefaultCategory) -> Self {
        Self {
            name: value.name.to_owned(),
            color: value.color.to_owned(),
            icon: value.icon.to_owned(),
            category_type: value.category_type,
        }
    }
}

/// Give `user_id` the default catalog unless it has already been given.
///
/// The claim and the inserts share one SQL transaction, so either the whole
/// catalog is stored and the user is marked as seeded, or nothing changes and
/// a later call may try again. Concurrent callers are serialised by the
/// database and only one of them inserts the catalog.
///
/// Returns `true` if this call inserted the catalog.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn seed_default_categories(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    let transaction = connection.unchecked_transaction()?;

    if !claim_category_seeding(user_id, &transaction)? {
        return Ok(false);
    }

    for default_category in &DEFAULT_CATEGORIES {
        create_category(user_id, &default_category.into(), &transaction)?;
    }

    transaction.commit()?;
    tracing::info!(
        "Created {} default categories for user {user_id}",
        DEFAULT_CATEGORIES.len()
    );

    Ok(true)
}

/// Get the categories of `user_id`, seeding the default catalog first if the
/// user has none and has never been given it.
///
/// The list is read again after any empty read, since a concurrent caller may
/// have inserted the catalog after this one first looked.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_or_seed_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let categories = get_categories(user_id, connection)?;

    if !categories.is_empty() {
        return Ok(categories);
    }

    seed_default_categories(user_id, connection)?;

    get_categories(user_id, connection)
}

#[cfg(test)]
mod catalog_tests {
    use std::{collections::HashSet, thread};

    use rusqlite::Connection;

    use crate::{
        category::{count_categories, delete_category, get_categories},
        db::{PoolConfig, create_pool, initialize},
        test_utils::insert_test_user,
        transaction_type::TransactionType,
    };

    use super::{DEFAULT_CATEGORIES, get_or_seed_categories, seed_default_categories};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn catalog_has_19_expense_and_2_income_categories() {
        let expenses = DEFAULT_CATEGORIES
            .iter()
            .filter(|category| category.category_type == TransactionType::Expense)
            .count();
        let incomes = DEFAULT_CATEGORIES
            .iter()
            .filter(|category| category.category_type == TransactionType::Income)
            .count();

        assert_eq!(expenses, 19);
        assert_eq!(incomes, 2);
    }

    #[test]
    fn catalog_icons_are_unique() {
        let icons: HashSet<&str> = DEFAULT_CATEGORIES.iter().map(|c| c.icon).collect();

        assert_eq!(icons.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn seeding_inserts_the_catalog_once() {
        let connection = get_test_db_connection();
        let user = insert_test_user("ana@example.com", &connection);

        assert!(seed_default_categories(user.id, &connection).unwrap());
        assert!(!seed_default_categories(user.id, &connection).unwrap());

        assert_eq!(
            count_categories(user.id, &connection).unwrap(),
            DEFAULT_CATEGORIES.len()
        );
    }

    #[test]
    fn seeding_only_touches_the_given_user() {
        let connection = get_test_db_connection();
        let ana = insert_test_user("ana@example.com", &connection);
        let beto = insert_test_user("beto@example.com", &connection);

        seed_default_categories(ana.id, &connection).unwrap();

        assert!(get_categories(beto.id, &connection).unwrap().is_empty());
        assert!(seed_default_categories(beto.id, &connection).unwrap());
    }

    #[test]
    fn concurrent_first_listings_all_see_the_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = PoolConfig {
            max_size: 8,
            ..PoolConfig::default()
        };
        let pool = create_pool(&temp_dir.path().join("test.db"), &config).unwrap();
        let user = insert_test_user("ana@example.com", &pool.get().unwrap());

        let counts: Vec<usize> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let connection = pool.get().unwrap();
                        get_or_seed_categories(user.id, &connection).unwrap().len()
                    })
                })
                .collect();

            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(counts, vec![DEFAULT_CATEGORIES.len(); 8]);
        assert_eq!(
            count_categories(user.id, &pool.get().unwrap()).unwrap(),
            DEFAULT_CATEGORIES.len()
        );
    }

    #[test]
    fn existing_categories_are_not_topped_up() {
        let connection = get_test_db_connection();
        let user = insert_test_user("ana@example.com", &connection);
        seed_default_categories(user.id, &connection).unwrap();
        let first = get_categories(user.id, &connection).unwrap()[0].id;
        delete_category(first, user.id, &connection).unwrap();

        let categories = get_or_seed_categories(user.id, &connection).unwrap();

        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len() - 1);
    }
}

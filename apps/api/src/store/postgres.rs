//! PostgreSQL implementation of [`CatalogStore`]
//!
//! Filter and order specifications are translated with sqlx's [`QueryBuilder`];
//! every user-supplied value is bound, never interpolated.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use storefront_shared_config::DatabaseConfig;

use super::{CatalogStore, EntityKind, ListQuery, Record, StoreError, StoreResult};
use crate::models::{
    Address, Cart, CartItem, Category, Collection, Product, ProductCategory, ProductCollection,
    Review, Theme, User, Variant, VariantSelection,
};
use crate::query::{FilterSpec, OrderSpec, ParentFilter, Predicate, SortField};

/// Escape special characters in ILIKE patterns so user input matches literally.
///
/// # Example
/// ```
/// use storefront_api::store::postgres::escape_ilike;
///
/// assert_eq!(escape_ilike("50%_off"), r"50\%\_off");
/// ```
pub fn escape_ilike(pattern: &str) -> String {
    pattern
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
}

// ============================================================================
// SQL column lists
//
// One SELECT list per entity kind. Link kinds select the parent key from the
// join table followed by the included row's columns.
// ============================================================================

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.name, p.slug, p.description, p.status, p.featured,
    p.price_cents, p.compare_at_cents, p.created_at, p.updated_at
"#;

const VARIANT_COLUMNS: &str = r#"
    v.id, v.product_id, v.sku, v.name, v.price_cents, v.stock, v.position, v.created_at
"#;

const VARIANT_SELECTION_COLUMNS: &str = "vs.id, vs.variant_id, vs.option_name, vs.value";

const CATEGORY_COLUMNS: &str =
    "c.id, c.name, c.slug, c.parent_id, c.is_visible, c.position, c.created_at";

const COLLECTION_COLUMNS: &str = "co.id, co.name, co.slug, co.is_visible, co.created_at";

const REVIEW_COLUMNS: &str = r#"
    r.id, r.product_id, r.user_id, r.rating, r.title, r.body, r.is_published, r.created_at
"#;

const USER_COLUMNS: &str = "u.id, u.email, u.display_name, u.created_at";

const ADDRESS_COLUMNS: &str = r#"
    a.id, a.user_id, a.line1, a.line2, a.city, a.postal_code, a.country,
    a.is_default, a.created_at
"#;

const CART_COLUMNS: &str = "ca.id, ca.user_id, ca.created_at, ca.updated_at";

const CART_ITEM_COLUMNS: &str = "ci.id, ci.cart_id, ci.variant_id, ci.quantity, ci.created_at";

const THEME_COLUMNS: &str = "t.id, t.name, t.is_active, t.settings, t.created_at";

struct Table {
    columns: String,
    from: &'static str,
    id: &'static str,
}

fn table(kind: EntityKind) -> Table {
    let (columns, from, id) = match kind {
        EntityKind::Product => (PRODUCT_COLUMNS.to_string(), "products p", "p.id"),
        EntityKind::Variant => (VARIANT_COLUMNS.to_string(), "variants v", "v.id"),
        EntityKind::VariantSelection => (
            VARIANT_SELECTION_COLUMNS.to_string(),
            "variant_selections vs",
            "vs.id",
        ),
        EntityKind::Category => (CATEGORY_COLUMNS.to_string(), "categories c", "c.id"),
        EntityKind::Collection => (COLLECTION_COLUMNS.to_string(), "collections co", "co.id"),
        EntityKind::ProductCategory => (
            format!("pc.product_id, {}", CATEGORY_COLUMNS),
            "product_categories pc JOIN categories c ON c.id = pc.category_id",
            "c.id",
        ),
        EntityKind::ProductCollection => (
            format!("pco.product_id, {}", COLLECTION_COLUMNS),
            "product_collections pco JOIN collections co ON co.id = pco.collection_id",
            "co.id",
        ),
        EntityKind::Review => (REVIEW_COLUMNS.to_string(), "reviews r", "r.id"),
        EntityKind::User => (USER_COLUMNS.to_string(), "users u", "u.id"),
        EntityKind::Address => (ADDRESS_COLUMNS.to_string(), "addresses a", "a.id"),
        EntityKind::Cart => (CART_COLUMNS.to_string(), "carts ca", "ca.id"),
        EntityKind::CartItem => (CART_ITEM_COLUMNS.to_string(), "cart_items ci", "ci.id"),
        EntityKind::Theme => (THEME_COLUMNS.to_string(), "themes t", "t.id"),
    };
    Table { columns, from, id }
}

/// Column a predicate applies to for the given kind, `None` if it has no meaning there
fn predicate_column(kind: EntityKind, predicate: &Predicate) -> Option<&'static str> {
    use EntityKind as K;
    use Predicate as P;

    match predicate {
        P::IdIn(_) => Some(table(kind).id),
        P::SlugIn(_) => match kind {
            K::Product => Some("p.slug"),
            K::Category | K::ProductCategory => Some("c.slug"),
            K::Collection | K::ProductCollection => Some("co.slug"),
            _ => None,
        },
        P::Status(_) => (kind == K::Product).then_some("p.status"),
        P::Featured(_) => (kind == K::Product).then_some("p.featured"),
        P::CategorySlug(_) | P::CollectionSlug(_) => (kind == K::Product).then_some("p.id"),
        P::NameContains(_) => match kind {
            K::Product => Some("p.name"),
            K::Variant => Some("v.name"),
            K::Category | K::ProductCategory => Some("c.name"),
            K::Collection | K::ProductCollection => Some("co.name"),
            K::Theme => Some("t.name"),
            _ => None,
        },
        P::Visible(_) => match kind {
            K::Category | K::ProductCategory => Some("c.is_visible"),
            K::Collection | K::ProductCollection => Some("co.is_visible"),
            _ => None,
        },
        P::Parent(_) => matches!(kind, K::Category | K::ProductCategory).then_some("c.parent_id"),
        P::ProductIdIn(_) => match kind {
            K::Variant => Some("v.product_id"),
            K::Review => Some("r.product_id"),
            K::ProductCategory => Some("pc.product_id"),
            K::ProductCollection => Some("pco.product_id"),
            _ => None,
        },
        P::VariantIdIn(_) => match kind {
            K::VariantSelection => Some("vs.variant_id"),
            K::CartItem => Some("ci.variant_id"),
            _ => None,
        },
        P::UserIdIn(_) => match kind {
            K::Address => Some("a.user_id"),
            K::Cart => Some("ca.user_id"),
            K::Review => Some("r.user_id"),
            _ => None,
        },
        P::CartIdIn(_) => (kind == K::CartItem).then_some("ci.cart_id"),
        P::Published(_) => (kind == K::Review).then_some("r.is_published"),
        P::Active(_) => (kind == K::Theme).then_some("t.is_active"),
    }
}

fn sort_column(kind: EntityKind, field: SortField) -> Option<&'static str> {
    use EntityKind as K;

    match field {
        SortField::Id => Some(table(kind).id),
        SortField::CreatedAt => match kind {
            K::Product => Some("p.created_at"),
            K::Variant => Some("v.created_at"),
            K::Category | K::ProductCategory => Some("c.created_at"),
            K::Collection | K::ProductCollection => Some("co.created_at"),
            K::Review => Some("r.created_at"),
            K::User => Some("u.created_at"),
            K::Address => Some("a.created_at"),
            K::Cart => Some("ca.created_at"),
            K::CartItem => Some("ci.created_at"),
            K::Theme => Some("t.created_at"),
            K::VariantSelection => None,
        },
        SortField::Price => match kind {
            K::Product => Some("p.price_cents"),
            K::Variant => Some("v.price_cents"),
            _ => None,
        },
        SortField::Name => match kind {
            K::Product => Some("p.name"),
            K::Variant => Some("v.name"),
            K::Category | K::ProductCategory => Some("c.name"),
            K::Collection | K::ProductCollection => Some("co.name"),
            K::Theme => Some("t.name"),
            _ => None,
        },
        SortField::Position => match kind {
            K::Variant => Some("v.position"),
            K::Category | K::ProductCategory => Some("c.position"),
            _ => None,
        },
        SortField::IsDefault => (kind == K::Address).then_some("a.is_default"),
    }
}

fn push_predicate(
    qb: &mut QueryBuilder<'static, Postgres>,
    kind: EntityKind,
    predicate: &Predicate,
) -> StoreResult<()> {
    let column =
        predicate_column(kind, predicate).ok_or_else(|| StoreError::UnsupportedPredicate {
            kind,
            predicate: predicate.name(),
        })?;

    match predicate {
        Predicate::IdIn(ids)
        | Predicate::ProductIdIn(ids)
        | Predicate::VariantIdIn(ids)
        | Predicate::UserIdIn(ids)
        | Predicate::CartIdIn(ids) => {
            qb.push(column).push(" = ANY(").push_bind(ids.clone()).push(")");
        }
        Predicate::SlugIn(slugs) => {
            qb.push(column)
                .push(" = ANY(")
                .push_bind(slugs.clone())
                .push(")");
        }
        Predicate::Status(status) => {
            qb.push(column).push(" = ").push_bind(*status);
        }
        Predicate::Featured(flag)
        | Predicate::Visible(flag)
        | Predicate::Published(flag)
        | Predicate::Active(flag) => {
            qb.push(column).push(" = ").push_bind(*flag);
        }
        Predicate::CategorySlug(slug) => {
            qb.push("EXISTS (SELECT 1 FROM product_categories x JOIN categories xc ON xc.id = x.category_id WHERE x.product_id = ")
                .push(column)
                .push(" AND xc.slug = ")
                .push_bind(slug.clone())
                .push(")");
        }
        Predicate::CollectionSlug(slug) => {
            qb.push("EXISTS (SELECT 1 FROM product_collections x JOIN collections xc ON xc.id = x.collection_id WHERE x.product_id = ")
                .push(column)
                .push(" AND xc.slug = ")
                .push_bind(slug.clone())
                .push(")");
        }
        Predicate::NameContains(text) => {
            qb.push(column)
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_ilike(text)));
        }
        Predicate::Parent(ParentFilter::Root) => {
            qb.push(column).push(" IS NULL");
        }
        Predicate::Parent(ParentFilter::Id(parent_id)) => {
            qb.push(column).push(" = ").push_bind(*parent_id);
        }
    }
    Ok(())
}

fn push_where(
    qb: &mut QueryBuilder<'static, Postgres>,
    kind: EntityKind,
    filter: &FilterSpec,
) -> StoreResult<()> {
    for (index, predicate) in filter.predicates().iter().enumerate() {
        qb.push(if index == 0 { " WHERE " } else { " AND " });
        push_predicate(qb, kind, predicate)?;
    }
    Ok(())
}

fn push_order(
    qb: &mut QueryBuilder<'static, Postgres>,
    kind: EntityKind,
    order: &OrderSpec,
) -> StoreResult<()> {
    let id = table(kind).id;
    let mut clauses = Vec::with_capacity(order.terms().len() + 1);
    for term in order.terms() {
        let column = sort_column(kind, term.field).ok_or(StoreError::UnsupportedSort {
            kind,
            field: term.field.as_str(),
        })?;
        clauses.push(format!("{} {}", column, term.direction.as_sql()));
    }
    // Stable pagination needs a unique tiebreaker.
    if !order.terms().iter().any(|t| t.field == SortField::Id) {
        clauses.push(format!("{} ASC", id));
    }
    qb.push(" ORDER BY ").push(clauses.join(", "));
    Ok(())
}

/// Build the SELECT statement for a list query
pub(crate) fn build_select(
    kind: EntityKind,
    query: &ListQuery,
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let table = table(kind);
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", table.columns, table.from));
    push_where(&mut qb, kind, &query.filter)?;
    push_order(&mut qb, kind, &query.order)?;
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    if let Some(skip) = query.skip {
        qb.push(" OFFSET ").push_bind(skip);
    }
    Ok(qb)
}

pub(crate) fn build_count(
    kind: EntityKind,
    filter: &FilterSpec,
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table(kind).from));
    push_where(&mut qb, kind, filter)?;
    Ok(qb)
}

/// Catalog store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool using the shared database configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_records(
        &self,
        kind: EntityKind,
        mut qb: QueryBuilder<'static, Postgres>,
    ) -> StoreResult<Vec<Record>> {
        macro_rules! rows {
            ($ty:ty) => {
                qb.build_query_as::<$ty>()
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(Record::from)
                    .collect()
            };
        }

        let records: Vec<Record> = match kind {
            EntityKind::Product => rows!(Product),
            EntityKind::Variant => rows!(Variant),
            EntityKind::VariantSelection => rows!(VariantSelection),
            EntityKind::Category => rows!(Category),
            EntityKind::Collection => rows!(Collection),
            EntityKind::ProductCategory => rows!(ProductCategory),
            EntityKind::ProductCollection => rows!(ProductCollection),
            EntityKind::Review => rows!(Review),
            EntityKind::User => rows!(User),
            EntityKind::Address => rows!(Address),
            EntityKind::Cart => rows!(Cart),
            EntityKind::CartItem => rows!(CartItem),
            EntityKind::Theme => rows!(Theme),
        };
        Ok(records)
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn find_many(&self, kind: EntityKind, query: &ListQuery) -> StoreResult<Vec<Record>> {
        let qb = build_select(kind, query)?;
        tracing::trace!(kind = %kind, sql = qb.sql(), "find_many");
        self.fetch_records(kind, qb).await
    }

    async fn find_by_keys(&self, kind: EntityKind, keys: &[i64]) -> StoreResult<Vec<Record>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = ListQuery::new(
            FilterSpec::new().with(Predicate::IdIn(keys.to_vec())),
            OrderSpec::unordered(),
        );
        let qb = build_select(kind, &query)?;
        self.fetch_records(kind, qb).await
    }

    async fn count(&self, kind: EntityKind, filter: &FilterSpec) -> StoreResult<i64> {
        let mut qb = build_count(kind, filter)?;
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context};

use crate::config::Config;
use crate::models::CatalogItem;

pub mod matrix;

pub use matrix::Matrix;

/// Read-only bundle of every model artifact the engine scores from.
///
/// All tables are loaded once at startup, cross-checked against each other,
/// and then shared behind an `Arc`. Row and column order is the catalog and
/// rating-file order, so a row index is stable across every table.
#[derive(Debug)]
pub struct ArtifactStore {
    catalog: Vec<CatalogItem>,
    users: Vec<String>,
    user_index: HashMap<String, usize>,
    ratings: Matrix<Option<f32>>,
    svd: Matrix<f32>,
    als: Matrix<f32>,
    similarity: Matrix<f32>,
}

impl ArtifactStore {
    /// Assembles a store from already-built tables, validating that their
    /// shapes agree with the catalog and user list.
    pub fn new(
        catalog: Vec<CatalogItem>,
        users: Vec<String>,
        ratings: Matrix<Option<f32>>,
        svd: Matrix<f32>,
        als: Matrix<f32>,
        similarity: Matrix<f32>,
    ) -> anyhow::Result<Self> {
        if catalog.is_empty() {
            bail!("catalog is empty");
        }
        build_index(catalog.iter().map(|item| item.id.as_str()), "item")?;
        let user_index = build_index(users.iter().map(String::as_str), "user")?;

        let n_users = users.len();
        let n_items = catalog.len();
        check_shape("rating matrix", ratings.rows(), ratings.cols(), n_users, n_items)?;
        check_shape("svd table", svd.rows(), svd.cols(), n_users, n_items)?;
        check_shape("als table", als.rows(), als.cols(), n_users, n_items)?;
        check_shape(
            "similarity matrix",
            similarity.rows(),
            similarity.cols(),
            n_items,
            n_items,
        )?;

        Ok(Self {
            catalog,
            users,
            user_index,
            ratings,
            svd,
            als,
            similarity,
        })
    }

    /// Loads every artifact named by the config, failing on the first
    /// structural problem.
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        let catalog = load_catalog(&config.catalog_path)
            .with_context(|| format!("loading catalog from {}", config.catalog_path))?;
        let item_index = build_index(catalog.iter().map(|item| item.id.as_str()), "item")?;

        let (users, ratings) = load_ratings(&config.ratings_path, &item_index, catalog.len())
            .with_context(|| format!("loading ratings from {}", config.ratings_path))?;

        let user_ids: Vec<&str> = users.iter().map(String::as_str).collect();
        let svd = load_score_table(&config.svd_predictions_path, &user_ids, catalog.len())
            .with_context(|| {
                format!("loading svd predictions from {}", config.svd_predictions_path)
            })?;
        let als = load_score_table(&config.als_predictions_path, &user_ids, catalog.len())
            .with_context(|| {
                format!("loading als predictions from {}", config.als_predictions_path)
            })?;

        let item_ids: Vec<&str> = catalog.iter().map(|item| item.id.as_str()).collect();
        let similarity = load_score_table(&config.similarity_path, &item_ids, item_ids.len())
            .with_context(|| format!("loading similarity from {}", config.similarity_path))?;

        tracing::info!(
            users = users.len(),
            items = catalog.len(),
            "Model artifacts loaded"
        );

        Self::new(catalog, users, ratings, svd, als, similarity)
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.catalog.len()
    }

    /// Catalog items in ranking column order
    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    /// Row index for a user, or None if the user is unknown
    pub fn user_row_index(&self, user: &str) -> Option<usize> {
        self.user_index.get(user).copied()
    }

    /// One user's ratings, None where the item is unrated
    pub fn rating_row(&self, row: usize) -> &[Option<f32>] {
        self.ratings.row(row)
    }

    /// One user's precomputed SVD scores
    pub fn svd_row(&self, row: usize) -> &[f32] {
        self.svd.row(row)
    }

    /// One user's precomputed ALS scores
    pub fn als_row(&self, row: usize) -> &[f32] {
        self.als.row(row)
    }

    /// Item-item similarity matrix in catalog order
    pub fn similarity(&self) -> &Matrix<f32> {
        &self.similarity
    }
}

fn build_index<'a>(
    ids: impl Iterator<Item = &'a str>,
    what: &str,
) -> anyhow::Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if index.insert(id.to_string(), position).is_some() {
            bail!("duplicate {what} id {id:?}");
        }
    }
    Ok(index)
}

fn check_shape(
    what: &str,
    rows: usize,
    cols: usize,
    expected_rows: usize,
    expected_cols: usize,
) -> anyhow::Result<()> {
    if rows != expected_rows || cols != expected_cols {
        bail!("{what} is {rows}x{cols}, expected {expected_rows}x{expected_cols}");
    }
    Ok(())
}

/// Reads the catalog CSV: a header line, then `item_id,title,rank` rows.
/// File order defines the canonical item order everywhere else.
fn load_catalog(path: &str) -> anyhow::Result<Vec<CatalogItem>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut catalog = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = record.with_context(|| format!("line {line}"))?;
        let (id, title, rank) = match (record.get(0), record.get(1), record.get(2)) {
            (Some(id), Some(title), Some(rank)) => (id, title, rank),
            _ => bail!("line {line}: expected item_id,title,rank"),
        };
        let rank = rank
            .trim()
            .parse::<u32>()
            .with_context(|| format!("line {line}: bad rank {rank:?}"))?;
        catalog.push(CatalogItem {
            id: id.to_string(),
            title: title.to_string(),
            rank,
        });
    }
    Ok(catalog)
}

/// Reads rating triples: a header line, then `user_id,item_id,rating` rows.
/// Users are assigned row indices in first-seen order. Items the triples
/// never mention stay None, and a repeated user-item pair is an error.
fn load_ratings(
    path: &str,
    item_index: &HashMap<String, usize>,
    n_items: usize,
) -> anyhow::Result<(Vec<String>, Matrix<Option<f32>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut users: Vec<String> = Vec::new();
    let mut user_rows: HashMap<String, usize> = HashMap::new();
    let mut data: Vec<Option<f32>> = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = record.with_context(|| format!("line {line}"))?;
        let (user, item, value) = match (record.get(0), record.get(1), record.get(2)) {
            (Some(user), Some(item), Some(value)) => (user, item, value),
            _ => bail!("line {line}: expected user_id,item_id,rating"),
        };
        let col = *item_index
            .get(item)
            .ok_or_else(|| anyhow!("line {line}: unknown item {item:?}"))?;
        let value: f32 = value
            .trim()
            .parse()
            .with_context(|| format!("line {line}: bad rating {value:?}"))?;

        let row = *user_rows.entry(user.to_string()).or_insert_with(|| {
            users.push(user.to_string());
            data.resize(data.len() + n_items, None);
            users.len() - 1
        });
        let slot = &mut data[row * n_items + col];
        if slot.is_some() {
            bail!("line {line}: duplicate rating for {user:?} and {item:?}");
        }
        *slot = Some(value);
    }

    let ratings = Matrix::from_vec(users.len(), n_items, data).map_err(|e| anyhow!(e))?;
    Ok((users, ratings))
}

/// Reads a dense, headerless score table. The first column keys each row
/// (a user id for prediction tables, an item id for the similarity matrix);
/// the remaining columns are one score per catalog item. Every key must
/// appear exactly once.
fn load_score_table(path: &str, row_ids: &[&str], n_cols: usize) -> anyhow::Result<Matrix<f32>> {
    let index: HashMap<&str, usize> = row_ids
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(path)?;
    let mut rows: Vec<Option<Vec<f32>>> = vec![None; row_ids.len()];

    for (i, record) in reader.records().enumerate() {
        let line = i + 1;
        let record = record.with_context(|| format!("line {line}"))?;
        let key = record
            .get(0)
            .ok_or_else(|| anyhow!("line {line}: empty record"))?;
        let position = *index
            .get(key)
            .ok_or_else(|| anyhow!("line {line}: unknown id {key:?}"))?;
        if rows[position].is_some() {
            bail!("line {line}: duplicate row for {key:?}");
        }

        let mut scores = Vec::with_capacity(n_cols);
        for field in record.iter().skip(1) {
            let score: f32 = field
                .trim()
                .parse()
                .with_context(|| format!("line {line}: bad score {field:?}"))?;
            scores.push(score);
        }
        if scores.len() != n_cols {
            bail!(
                "line {line}: expected {n_cols} scores, found {}",
                scores.len()
            );
        }
        rows[position] = Some(scores);
    }

    let mut data = Vec::with_capacity(row_ids.len() * n_cols);
    for (position, row) in rows.into_iter().enumerate() {
        match row {
            Some(scores) => data.extend(scores),
            None => bail!("no row for {:?}", row_ids[position]),
        }
    }
    Matrix::from_vec(row_ids.len(), n_cols, data).map_err(|e| anyhow!(e))
}

//! Movie repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;

use super::MovieRepository;
use crate::filters::{FilterValue, MovieFilter};
use crate::models::{Movie, MovieFields};

/// Columns of `tb_movie` in schema order
const MOVIE_COLUMNS: &str = r#"id, "type", title, director, "cast", country, date_added,
       release_year, rating, duration, listed_in, description"#;

/// Movie repository for database operations
#[derive(Clone)]
pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    /// Create a new movie repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn list(&self, filter: &MovieFilter) -> DatabaseResult<Vec<Movie>> {
        let sql = format!(
            "SELECT {} FROM tb_movie{} ORDER BY id",
            MOVIE_COLUMNS,
            filter.where_clause()
        );

        let mut query = sqlx::query_as::<_, Movie>(&sql);
        for value in filter.values() {
            query = match value {
                FilterValue::Integer(year) => query.bind(*year),
                FilterValue::Text(text) => query.bind(text.as_str()),
            };
        }

        let movies = query.fetch_all(&self.pool).await?;
        Ok(movies)
    }

    async fn find(&self, id: &str) -> DatabaseResult<Option<Movie>> {
        let sql = format!("SELECT {} FROM tb_movie WHERE id = $1", MOVIE_COLUMNS);

        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn insert(&self, id: &str, fields: &MovieFields) -> DatabaseResult<Movie> {
        info!("Inserting movie {}", id);

        let sql = format!(
            r#"
            INSERT INTO tb_movie (id, "type", title, director, "cast", country,
                                  release_year, rating, duration, listed_in, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        );

        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .bind(&fields.movie_type)
            .bind(&fields.title)
            .bind(&fields.director)
            .bind(&fields.cast)
            .bind(&fields.country)
            .bind(fields.release_year)
            .bind(&fields.rating)
            .bind(&fields.duration)
            .bind(&fields.listed_in)
            .bind(&fields.description)
            .fetch_one(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn update(&self, id: &str, fields: &MovieFields) -> DatabaseResult<Option<Movie>> {
        info!("Updating movie {}", id);

        let sql = format!(
            r#"
            UPDATE tb_movie
            SET "type" = $2,
                title = $3,
                director = COALESCE($4, director),
                "cast" = COALESCE($5, "cast"),
                country = COALESCE($6, country),
                release_year = $7,
                rating = COALESCE($8, rating),
                duration = COALESCE($9, duration),
                listed_in = $10,
                description = $11
            WHERE id = $1
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        );

        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .bind(&fields.movie_type)
            .bind(&fields.title)
            .bind(&fields.director)
            .bind(&fields.cast)
            .bind(&fields.country)
            .bind(fields.release_year)
            .bind(&fields.rating)
            .bind(&fields.duration)
            .bind(&fields.listed_in)
            .bind(&fields.description)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn delete(&self, id: &str) -> DatabaseResult<Option<Movie>> {
        info!("Deleting movie {}", id);

        let sql = format!("DELETE FROM tb_movie WHERE id = $1 RETURNING {}", MOVIE_COLUMNS);

        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ensure_schema;
    use crate::filters::FilterKey;
    use common::database::{DatabaseConfig, init_pool};
    use std::collections::HashMap;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    async fn repository() -> Result<PgMovieRepository, Box<dyn std::error::Error>> {
        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        ensure_schema(&pool).await?;
        Ok(PgMovieRepository::new(pool))
    }

    fn fields(title: &str, country: Option<&str>, release_year: i32) -> MovieFields {
        MovieFields {
            movie_type: "Movie".to_string(),
            title: title.to_string(),
            director: Some("Fernando Meirelles".to_string()),
            cast: None,
            country: country.map(str::to_string),
            release_year,
            rating: Some("R".to_string()),
            duration: Some("130 min".to_string()),
            listed_in: "Dramas".to_string(),
            description: "Two boys grow up in a violent neighborhood.".to_string(),
        }
    }

    fn filter(pairs: &[(&str, &str)]) -> MovieFilter {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MovieFilter::build(
            &[FilterKey::Title, FilterKey::Country, FilterKey::ReleaseYear],
            &params,
        )
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_filters_run_against_postgres() -> TestResult {
        let repository = repository().await?;
        let title = "Cidade de Deus (filter test)";
        repository.delete("ft-1").await?;
        repository.delete("ft-2").await?;
        repository.insert("ft-1", &fields(title, Some("Brazil"), 2002)).await?;
        repository.insert("ft-2", &fields(title, Some("Portugal"), 2020)).await?;

        let by_country = repository
            .list(&filter(&[("title", title), ("country", "brazil")]))
            .await?;
        let ids: Vec<&str> = by_country.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ft-1"]);
        assert_eq!(by_country[0].country.as_deref(), Some("Brazil"));

        let by_year = repository
            .list(&filter(&[("title", title), ("release_year", " 2020 ")]))
            .await?;
        let ids: Vec<&str> = by_year.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ft-2"]);

        let unparsable_year = repository
            .list(&filter(&[("title", title), ("release_year", "soon")]))
            .await?;
        assert!(unparsable_year.is_empty());

        let unfiltered = repository.list(&filter(&[("title", title)])).await?;
        assert_eq!(unfiltered.len(), 2);

        repository.delete("ft-1").await?;
        repository.delete("ft-2").await?;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_partial_update_keeps_unspecified_columns() -> TestResult {
        let repository = repository().await?;
        repository.delete("pu-1").await?;
        let inserted = repository
            .insert("pu-1", &fields("Partial update", Some("Brazil"), 2002))
            .await?;
        assert!(inserted.date_added.is_some());

        let mut changes = fields("Partial update, renamed", None, 2003);
        changes.director = None;
        changes.rating = Some("PG-13".to_string());

        let updated = repository
            .update("pu-1", &changes)
            .await?
            .ok_or("updated movie missing")?;
        assert_eq!(updated.title, "Partial update, renamed");
        assert_eq!(updated.release_year, 2003);
        assert_eq!(updated.rating.as_deref(), Some("PG-13"));
        assert_eq!(updated.country.as_deref(), Some("Brazil"));
        assert_eq!(updated.director.as_deref(), Some("Fernando Meirelles"));
        assert_eq!(updated.date_added, inserted.date_added);

        assert_eq!(repository.update("pu-none", &changes).await?, None);

        repository.delete("pu-1").await?;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_delete_returns_the_row_once() -> TestResult {
        let repository = repository().await?;
        repository.delete("dl-1").await?;
        repository
            .insert("dl-1", &fields("Delete twice", None, 1999))
            .await?;

        let removed = repository.delete("dl-1").await?.ok_or("nothing deleted")?;
        assert_eq!(removed.id, "dl-1");
        assert_eq!(repository.find("dl-1").await?, None);
        assert_eq!(repository.delete("dl-1").await?, None);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_duplicate_id_is_a_query_error() -> TestResult {
        let repository = repository().await?;
        repository.delete("dup-1").await?;
        repository
            .insert("dup-1", &fields("Duplicate", None, 2010))
            .await?;

        let second = repository
            .insert("dup-1", &fields("Duplicate", None, 2010))
            .await;
        assert!(matches!(
            second,
            Err(common::error::DatabaseError::Query(_))
        ));

        repository.delete("dup-1").await?;
        Ok(())
    }
}

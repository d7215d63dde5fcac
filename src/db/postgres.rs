//! PostgreSQL storage for prices, indicator readings, rankings and alerts

use crate::config;
use crate::db::error::StoreError;
use crate::db::{IndicatorStore, FUNDAMENTALS_MAX_AGE_DAYS};
use crate::models::alert::{Alert, AlertLedgerEntry};
use crate::models::indicators::{
    AnchoredObvReading, ForceIndexReading, ForceIndexState, IndicatorKind, MomentumState, ObvCross,
    PricePoint, PriorState, SymbolReadings, WilliamsRReading,
};
use crate::models::market::{MarketKey, SeriesKey, SymbolInfo};
use crate::models::ranking::{Fundamentals, Metric, MetricValue, RankedMetric};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::types::Json;
use tokio_postgres::{Client, NoTls, Row};

const READING_COLUMNS: &str = "symbol, date, williams_r, williams_r_ema, williams_r_state, \
     force_index_fast, force_index_slow, force_index_prev_fast, force_index_prev_slow, \
     force_index_state, anchored_obv, anchor_date, obv_confidence, obv_cross";

const FUNDAMENTAL_COLUMNS: &str = "pe_ratio, ev_ebitda, pb_ratio, peg_ratio, earnings_yield, \
     book_to_price, price_to_sales, return_on_equity, return_on_assets, free_cash_flow_yield, \
     shareholder_yield";

const SCHEMA: [&str; 6] = [
    "CREATE TABLE IF NOT EXISTS symbols (
        market TEXT NOT NULL,
        base TEXT NOT NULL,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        PRIMARY KEY (market, base, symbol)
    )",
    "CREATE TABLE IF NOT EXISTS price_points (
        market TEXT NOT NULL,
        base TEXT NOT NULL,
        symbol TEXT NOT NULL,
        date DATE NOT NULL,
        open DOUBLE PRECISION,
        high DOUBLE PRECISION,
        low DOUBLE PRECISION,
        close DOUBLE PRECISION,
        volume DOUBLE PRECISION,
        PRIMARY KEY (market, base, symbol, date)
    )",
    "CREATE TABLE IF NOT EXISTS fundamentals (
        market TEXT NOT NULL,
        base TEXT NOT NULL,
        symbol TEXT NOT NULL,
        date DATE NOT NULL,
        pe_ratio DOUBLE PRECISION,
        ev_ebitda DOUBLE PRECISION,
        pb_ratio DOUBLE PRECISION,
        peg_ratio DOUBLE PRECISION,
        earnings_yield DOUBLE PRECISION,
        book_to_price DOUBLE PRECISION,
        price_to_sales DOUBLE PRECISION,
        return_on_equity DOUBLE PRECISION,
        return_on_assets DOUBLE PRECISION,
        free_cash_flow_yield DOUBLE PRECISION,
        shareholder_yield DOUBLE PRECISION,
        PRIMARY KEY (market, base, symbol, date)
    )",
    "CREATE TABLE IF NOT EXISTS weekly_indicators (
        market TEXT NOT NULL,
        base TEXT NOT NULL,
        symbol TEXT NOT NULL,
        date DATE NOT NULL,
        williams_r DOUBLE PRECISION,
        williams_r_ema DOUBLE PRECISION,
        williams_r_state TEXT,
        force_index_fast DOUBLE PRECISION,
        force_index_slow DOUBLE PRECISION,
        force_index_prev_fast DOUBLE PRECISION,
        force_index_prev_slow DOUBLE PRECISION,
        force_index_state TEXT,
        anchored_obv DOUBLE PRECISION,
        anchor_date DATE,
        obv_confidence DOUBLE PRECISION,
        obv_cross TEXT,
        PRIMARY KEY (market, base, symbol, date)
    )",
    "CREATE TABLE IF NOT EXISTS metric_rankings (
        market TEXT NOT NULL,
        base TEXT NOT NULL,
        date DATE NOT NULL,
        metric TEXT NOT NULL,
        symbol TEXT NOT NULL,
        value DOUBLE PRECISION,
        rank DOUBLE PRECISION NOT NULL,
        PRIMARY KEY (market, base, date, metric, symbol)
    )",
    "CREATE TABLE IF NOT EXISTS alert_ledger (
        market TEXT NOT NULL,
        base TEXT NOT NULL,
        date DATE NOT NULL,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        alerts JSONB NOT NULL DEFAULT '[]'::jsonb,
        PRIMARY KEY (market, base, date, symbol)
    )",
];

pub struct PostgresStore {
    client: Arc<RwLock<Option<Client>>>,
}

impl PostgresStore {
    /// Connect using `DATABASE_URL` and create missing tables
    pub async fn new() -> Result<Self, StoreError> {
        Self::connect(&config::get_database_url()).await
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect to PostgreSQL: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        let store = Self {
            client: Arc::new(RwLock::new(Some(client))),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        for statement in SCHEMA {
            c.batch_execute(statement).await?;
        }
        Ok(())
    }

    /// Drop the client; later calls fail with `StoreError::Unavailable`
    pub async fn close(&self) {
        self.client.write().await.take();
    }
}

fn connected(client: &Option<Client>) -> Result<&Client, StoreError> {
    client
        .as_ref()
        .ok_or_else(|| StoreError::Unavailable("PostgreSQL client is closed".to_string()))
}

fn clear_assignments(kind: IndicatorKind) -> &'static str {
    match kind {
        IndicatorKind::WilliamsR => "williams_r = NULL, williams_r_ema = NULL, williams_r_state = NULL",
        IndicatorKind::ForceIndex => {
            "force_index_fast = NULL, force_index_slow = NULL, force_index_prev_fast = NULL, \
             force_index_prev_slow = NULL, force_index_state = NULL"
        }
        IndicatorKind::AnchoredObv => {
            "anchored_obv = NULL, anchor_date = NULL, obv_confidence = NULL, obv_cross = NULL"
        }
    }
}

fn indicator_column(metric: Metric) -> Option<&'static str> {
    match metric {
        Metric::WilliamsR => Some("williams_r"),
        Metric::WilliamsREma => Some("williams_r_ema"),
        Metric::ForceIndexFast => Some("force_index_fast"),
        Metric::ForceIndexSlow => Some("force_index_slow"),
        _ => None,
    }
}

fn parse_state<T: std::str::FromStr<Err = String>>(raw: Option<String>) -> Result<Option<T>, StoreError> {
    raw.map(|s| s.parse::<T>().map_err(StoreError::Decode)).transpose()
}

fn readings_from_row(row: &Row) -> Result<SymbolReadings, StoreError> {
    let symbol: String = row.try_get(0)?;
    let date: NaiveDate = row.try_get(1)?;
    let mut readings = SymbolReadings::empty(symbol, date);

    let williams_r: Option<f64> = row.try_get(2)?;
    let williams_r_ema: Option<f64> = row.try_get(3)?;
    let williams_state: Option<MomentumState> = parse_state(row.try_get(4)?)?;
    if let (Some(williams_r), Some(williams_r_ema), Some(state)) = (williams_r, williams_r_ema, williams_state) {
        readings.williams_r = Some(WilliamsRReading {
            timestamp: date,
            williams_r,
            williams_r_ema,
            state,
        });
    }

    let fast: Option<f64> = row.try_get(5)?;
    let slow: Option<f64> = row.try_get(6)?;
    let prev_fast: Option<f64> = row.try_get(7)?;
    let prev_slow: Option<f64> = row.try_get(8)?;
    let force_state: Option<ForceIndexState> = parse_state(row.try_get(9)?)?;
    if let (Some(fast), Some(slow), Some(state)) = (fast, slow, force_state) {
        readings.force_index = Some(ForceIndexReading {
            timestamp: date,
            fast,
            slow,
            previous_fast: prev_fast.unwrap_or(fast),
            previous_slow: prev_slow.unwrap_or(slow),
            state,
        });
    }

    let obv: Option<f64> = row.try_get(10)?;
    let anchor_date: Option<NaiveDate> = row.try_get(11)?;
    let confidence: Option<f64> = row.try_get(12)?;
    let cross: Option<ObvCross> = parse_state(row.try_get(13)?)?;
    if let (Some(anchored_obv), Some(anchor_date)) = (obv, anchor_date) {
        readings.anchored_obv = Some(AnchoredObvReading {
            timestamp: date,
            anchored_obv,
            anchor_date,
            confidence: confidence.unwrap_or(0.0),
            cross: cross.unwrap_or(ObvCross::None),
        });
    }

    Ok(readings)
}

fn ranking_from_row(row: &Row) -> Result<RankedMetric, StoreError> {
    let metric: String = row.try_get(2)?;
    Ok(RankedMetric {
        symbol: row.try_get(0)?,
        date: row.try_get(1)?,
        metric: metric.parse().map_err(StoreError::Decode)?,
        value: row.try_get(3)?,
        rank: row.try_get(4)?,
    })
}

fn ledger_from_row(row: &Row) -> Result<AlertLedgerEntry, StoreError> {
    let Json(alerts): Json<Vec<Alert>> = row.try_get(3)?;
    Ok(AlertLedgerEntry {
        symbol: row.try_get(0)?,
        date: row.try_get(1)?,
        name: row.try_get(2)?,
        alerts,
    })
}

#[async_trait]
impl IndicatorStore for PostgresStore {
    async fn upsert_symbol(&self, key: &SeriesKey, name: &str) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        c.execute(
            "INSERT INTO symbols (market, base, symbol, name) VALUES ($1, $2, $3, $4)
             ON CONFLICT (market, base, symbol) DO UPDATE SET name = EXCLUDED.name",
            &[&key.market.as_str(), &key.base.as_str(), &key.symbol, &name],
        )
        .await?;
        Ok(())
    }

    async fn list_symbols(
        &self,
        market: MarketKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SymbolInfo>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let rows = c
            .query(
                "SELECT p.symbol, COALESCE(MAX(s.name), p.symbol)
                 FROM price_points p
                 LEFT JOIN symbols s
                   ON s.market = p.market AND s.base = p.base AND s.symbol = p.symbol
                 WHERE p.market = $1 AND p.base = $2 AND p.date >= $3 AND p.date <= $4
                 GROUP BY p.symbol
                 ORDER BY p.symbol",
                &[&market.market.as_str(), &market.base.as_str(), &from, &to],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<SymbolInfo, StoreError> {
                let symbol: String = row.try_get(0)?;
                let name: String = row.try_get(1)?;
                Ok(SymbolInfo::new(symbol).with_name(name))
            })
            .collect()
    }

    async fn upsert_prices(&self, key: &SeriesKey, points: &[PricePoint]) -> Result<(), StoreError> {
        let mut guard = self.client.write().await;
        let c = guard
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("PostgreSQL client is closed".to_string()))?;
        let tx = c.transaction().await?;
        let stmt = tx
            .prepare(
                "INSERT INTO price_points (market, base, symbol, date, open, high, low, close, volume)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 ON CONFLICT (market, base, symbol, date) DO UPDATE SET
                    open = EXCLUDED.open, high = EXCLUDED.high, low = EXCLUDED.low,
                    close = EXCLUDED.close, volume = EXCLUDED.volume",
            )
            .await?;
        for p in points {
            tx.execute(
                &stmt,
                &[
                    &key.market.as_str(),
                    &key.base.as_str(),
                    &key.symbol,
                    &p.timestamp,
                    &p.open,
                    &p.high,
                    &p.low,
                    &p.close,
                    &p.volume,
                ],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_prices(
        &self,
        key: &SeriesKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let rows = c
            .query(
                "SELECT date, open, high, low, close, volume
                 FROM price_points
                 WHERE market = $1 AND base = $2 AND symbol = $3 AND date >= $4 AND date <= $5
                 ORDER BY date ASC",
                &[&key.market.as_str(), &key.base.as_str(), &key.symbol, &from, &to],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<PricePoint, StoreError> {
                Ok(PricePoint {
                    timestamp: row.try_get(0)?,
                    open: row.try_get(1)?,
                    high: row.try_get(2)?,
                    low: row.try_get(3)?,
                    close: row.try_get(4)?,
                    volume: row.try_get(5)?,
                })
            })
            .collect()
    }

    async fn upsert_fundamentals(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        f: &Fundamentals,
    ) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let query = format!(
            "INSERT INTO fundamentals (market, base, symbol, date, {FUNDAMENTAL_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (market, base, symbol, date) DO UPDATE SET
                pe_ratio = EXCLUDED.pe_ratio, ev_ebitda = EXCLUDED.ev_ebitda,
                pb_ratio = EXCLUDED.pb_ratio, peg_ratio = EXCLUDED.peg_ratio,
                earnings_yield = EXCLUDED.earnings_yield, book_to_price = EXCLUDED.book_to_price,
                price_to_sales = EXCLUDED.price_to_sales, return_on_equity = EXCLUDED.return_on_equity,
                return_on_assets = EXCLUDED.return_on_assets,
                free_cash_flow_yield = EXCLUDED.free_cash_flow_yield,
                shareholder_yield = EXCLUDED.shareholder_yield"
        );
        c.execute(
            &query,
            &[
                &key.market.as_str(),
                &key.base.as_str(),
                &key.symbol,
                &date,
                &f.pe_ratio,
                &f.ev_ebitda,
                &f.pb_ratio,
                &f.peg_ratio,
                &f.earnings_yield,
                &f.book_to_price,
                &f.price_to_sales,
                &f.return_on_equity,
                &f.return_on_assets,
                &f.free_cash_flow_yield,
                &f.shareholder_yield,
            ],
        )
        .await?;
        Ok(())
    }

    async fn load_prior_state(&self, key: &SeriesKey, before: NaiveDate) -> Result<PriorState, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let params: [&(dyn tokio_postgres::types::ToSql + Sync); 4] =
            [&key.market.as_str(), &key.base.as_str(), &key.symbol, &before];

        let mut prior = PriorState::default();

        if let Some(row) = c
            .query_opt(
                "SELECT williams_r_state FROM weekly_indicators
                 WHERE market = $1 AND base = $2 AND symbol = $3 AND date < $4
                   AND williams_r_state IS NOT NULL
                 ORDER BY date DESC LIMIT 1",
                &params,
            )
            .await?
        {
            prior.williams_r = parse_state(row.try_get(0)?)?;
        }

        if let Some(row) = c
            .query_opt(
                "SELECT force_index_fast, force_index_slow, force_index_state FROM weekly_indicators
                 WHERE market = $1 AND base = $2 AND symbol = $3 AND date < $4
                   AND force_index_state IS NOT NULL
                 ORDER BY date DESC LIMIT 1",
                &params,
            )
            .await?
        {
            let fast: Option<f64> = row.try_get(0)?;
            let slow: Option<f64> = row.try_get(1)?;
            let state: Option<ForceIndexState> = parse_state(row.try_get(2)?)?;
            if let (Some(fast), Some(slow), Some(state)) = (fast, slow, state) {
                prior = prior.with_force_index(fast, slow, state);
            }
        }

        if let Some(row) = c
            .query_opt(
                "SELECT anchored_obv FROM weekly_indicators
                 WHERE market = $1 AND base = $2 AND symbol = $3 AND date < $4
                   AND anchored_obv IS NOT NULL
                 ORDER BY date DESC LIMIT 1",
                &params,
            )
            .await?
        {
            prior.anchored_obv = row.try_get(0)?;
        }

        Ok(prior)
    }

    async fn upsert_williams_r(&self, key: &SeriesKey, r: &WilliamsRReading) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        c.execute(
            "INSERT INTO weekly_indicators
                (market, base, symbol, date, williams_r, williams_r_ema, williams_r_state)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (market, base, symbol, date) DO UPDATE SET
                williams_r = EXCLUDED.williams_r,
                williams_r_ema = EXCLUDED.williams_r_ema,
                williams_r_state = EXCLUDED.williams_r_state",
            &[
                &key.market.as_str(),
                &key.base.as_str(),
                &key.symbol,
                &r.timestamp,
                &r.williams_r,
                &r.williams_r_ema,
                &r.state.as_str(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_force_index(&self, key: &SeriesKey, r: &ForceIndexReading) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        c.execute(
            "INSERT INTO weekly_indicators
                (market, base, symbol, date, force_index_fast, force_index_slow,
                 force_index_prev_fast, force_index_prev_slow, force_index_state)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (market, base, symbol, date) DO UPDATE SET
                force_index_fast = EXCLUDED.force_index_fast,
                force_index_slow = EXCLUDED.force_index_slow,
                force_index_prev_fast = EXCLUDED.force_index_prev_fast,
                force_index_prev_slow = EXCLUDED.force_index_prev_slow,
                force_index_state = EXCLUDED.force_index_state",
            &[
                &key.market.as_str(),
                &key.base.as_str(),
                &key.symbol,
                &r.timestamp,
                &r.fast,
                &r.slow,
                &r.previous_fast,
                &r.previous_slow,
                &r.state.as_str(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_anchored_obv(&self, key: &SeriesKey, r: &AnchoredObvReading) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        c.execute(
            "INSERT INTO weekly_indicators
                (market, base, symbol, date, anchored_obv, anchor_date, obv_confidence, obv_cross)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (market, base, symbol, date) DO UPDATE SET
                anchored_obv = EXCLUDED.anchored_obv,
                anchor_date = EXCLUDED.anchor_date,
                obv_confidence = EXCLUDED.obv_confidence,
                obv_cross = EXCLUDED.obv_cross",
            &[
                &key.market.as_str(),
                &key.base.as_str(),
                &key.symbol,
                &r.timestamp,
                &r.anchored_obv,
                &r.anchor_date,
                &r.confidence,
                &r.cross.as_str(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn clear_readings(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        kinds: &[IndicatorKind],
    ) -> Result<(), StoreError> {
        if kinds.is_empty() {
            return Ok(());
        }
        let assignments: Vec<&str> = kinds.iter().map(|&kind| clear_assignments(kind)).collect();
        let params: [&(dyn tokio_postgres::types::ToSql + Sync); 4] =
            [&key.market.as_str(), &key.base.as_str(), &key.symbol, &date];

        let mut guard = self.client.write().await;
        let c = guard
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("PostgreSQL client is closed".to_string()))?;
        let tx = c.transaction().await?;
        tx.execute(
            &format!(
                "UPDATE weekly_indicators SET {}
                 WHERE market = $1 AND base = $2 AND symbol = $3 AND date = $4",
                assignments.join(", ")
            ),
            &params,
        )
        .await?;
        tx.execute(
            "DELETE FROM weekly_indicators
             WHERE market = $1 AND base = $2 AND symbol = $3 AND date = $4
               AND williams_r_state IS NULL AND force_index_state IS NULL AND anchored_obv IS NULL",
            &params,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_readings(&self, key: &SeriesKey, date: NaiveDate) -> Result<SymbolReadings, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let query = format!(
            "SELECT {READING_COLUMNS} FROM weekly_indicators
             WHERE market = $1 AND base = $2 AND symbol = $3 AND date = $4"
        );
        let row = c
            .query_opt(&query, &[&key.market.as_str(), &key.base.as_str(), &key.symbol, &date])
            .await?;
        match row {
            Some(row) => readings_from_row(&row),
            None => Ok(SymbolReadings::empty(key.symbol.clone(), date)),
        }
    }

    async fn load_metric_values(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<Vec<MetricValue>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;

        if let Some(column) = indicator_column(metric) {
            let query = format!(
                "SELECT symbol, {column} FROM weekly_indicators
                 WHERE market = $1 AND base = $2 AND date = $3
                 ORDER BY symbol"
            );
            let rows = c
                .query(&query, &[&market.market.as_str(), &market.base.as_str(), &date])
                .await?;
            return rows
                .iter()
                .map(|row| -> Result<MetricValue, StoreError> {
                    Ok(MetricValue::new(row.try_get::<_, String>(0)?, row.try_get(1)?))
                })
                .collect();
        }

        if !metric.is_fundamental() {
            return Ok(Vec::new());
        }

        let oldest = date - Duration::days(FUNDAMENTALS_MAX_AGE_DAYS);
        let query = format!(
            "SELECT DISTINCT ON (symbol) symbol, {FUNDAMENTAL_COLUMNS}
             FROM fundamentals
             WHERE market = $1 AND base = $2 AND date <= $3 AND date > $4
             ORDER BY symbol, date DESC"
        );
        let rows = c
            .query(&query, &[&market.market.as_str(), &market.base.as_str(), &date, &oldest])
            .await?;

        rows.iter()
            .map(|row| -> Result<MetricValue, StoreError> {
                let f = Fundamentals {
                    pe_ratio: row.try_get(1)?,
                    ev_ebitda: row.try_get(2)?,
                    pb_ratio: row.try_get(3)?,
                    peg_ratio: row.try_get(4)?,
                    earnings_yield: row.try_get(5)?,
                    book_to_price: row.try_get(6)?,
                    price_to_sales: row.try_get(7)?,
                    return_on_equity: row.try_get(8)?,
                    return_on_assets: row.try_get(9)?,
                    free_cash_flow_yield: row.try_get(10)?,
                    shareholder_yield: row.try_get(11)?,
                };
                Ok(MetricValue::new(row.try_get::<_, String>(0)?, f.value(metric)))
            })
            .collect()
    }

    async fn replace_rankings(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
        rankings: &[RankedMetric],
    ) -> Result<(), StoreError> {
        let mut guard = self.client.write().await;
        let c = guard
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("PostgreSQL client is closed".to_string()))?;
        let (m, b, name) = (market.market.as_str(), market.base.as_str(), metric.as_str());

        let tx = c.transaction().await?;
        tx.execute(
            "DELETE FROM metric_rankings WHERE market = $1 AND base = $2 AND date = $3 AND metric = $4",
            &[&m, &b, &date, &name],
        )
        .await?;
        let stmt = tx
            .prepare(
                "INSERT INTO metric_rankings (market, base, date, metric, symbol, value, rank)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .await?;
        for r in rankings {
            tx.execute(&stmt, &[&m, &b, &date, &name, &r.symbol, &r.value, &r.rank])
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_rankings(&self, market: MarketKey, date: NaiveDate) -> Result<Vec<RankedMetric>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let rows = c
            .query(
                "SELECT symbol, date, metric, value, rank FROM metric_rankings
                 WHERE market = $1 AND base = $2 AND date = $3
                 ORDER BY metric, rank, symbol",
                &[&market.market.as_str(), &market.base.as_str(), &date],
            )
            .await?;
        rows.iter().map(ranking_from_row).collect()
    }

    async fn load_alert_entry(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
    ) -> Result<Option<AlertLedgerEntry>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let row = c
            .query_opt(
                "SELECT symbol, date, name, alerts FROM alert_ledger
                 WHERE market = $1 AND base = $2 AND date = $3 AND symbol = $4",
                &[&key.market.as_str(), &key.base.as_str(), &date, &key.symbol],
            )
            .await?;
        row.as_ref().map(ledger_from_row).transpose()
    }

    async fn upsert_alert_entry(&self, market: MarketKey, entry: &AlertLedgerEntry) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        c.execute(
            "INSERT INTO alert_ledger (market, base, date, symbol, name, alerts)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (market, base, date, symbol) DO UPDATE SET
                name = EXCLUDED.name, alerts = EXCLUDED.alerts",
            &[
                &market.market.as_str(),
                &market.base.as_str(),
                &entry.date,
                &entry.symbol,
                &entry.name,
                &Json(&entry.alerts),
            ],
        )
        .await?;
        Ok(())
    }

    async fn latest_readings(&self, market: MarketKey) -> Result<Vec<SymbolReadings>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let query = format!(
            "SELECT DISTINCT ON (symbol) {READING_COLUMNS} FROM weekly_indicators
             WHERE market = $1 AND base = $2
             ORDER BY symbol, date DESC"
        );
        let rows = c
            .query(&query, &[&market.market.as_str(), &market.base.as_str()])
            .await?;
        rows.iter().map(readings_from_row).collect()
    }

    async fn latest_rankings(&self, market: MarketKey) -> Result<Vec<RankedMetric>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let rows = c
            .query(
                "SELECT DISTINCT ON (symbol, metric) symbol, date, metric, value, rank
                 FROM metric_rankings
                 WHERE market = $1 AND base = $2
                 ORDER BY symbol, metric, date DESC",
                &[&market.market.as_str(), &market.base.as_str()],
            )
            .await?;
        rows.iter().map(ranking_from_row).collect()
    }

    async fn recent_alerts(
        &self,
        market: MarketKey,
        since: NaiveDate,
    ) -> Result<Vec<AlertLedgerEntry>, StoreError> {
        let guard = self.client.read().await;
        let c = connected(&guard)?;
        let rows = c
            .query(
                "SELECT symbol, date, name, alerts FROM alert_ledger
                 WHERE market = $1 AND base = $2 AND date >= $3
                 ORDER BY date DESC, symbol",
                &[&market.market.as_str(), &market.base.as_str(), &since],
            )
            .await?;
        rows.iter().map(ledger_from_row).collect()
    }
}

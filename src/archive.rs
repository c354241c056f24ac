/*!
 * A history of batches.
 *
 * The snapshot file only ever holds the latest batch. The archive is an optional SQLite database
 * that keeps a summary row for every batch along with its ranked clusters, so trends across a
 * burning season can be looked at later.
 */
use crate::{
    attribution::AttributionSeverity, error::BurnWatchResult, hotspot::SourceTier,
    snapshot::BatchSnapshot,
};
use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Connection, OpenFlags, Row, ToSql};
use std::{
    fmt::{self, Display},
    path::Path,
    str::FromStr,
};

/// Represents a connection to the database where the batch history is stored.
pub struct SnapshotArchive {
    conn: Connection,
}

impl SnapshotArchive {
    /// Open a connection to the archive, creating it if needed.
    pub fn connect<P: AsRef<Path>>(path: P) -> BurnWatchResult<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Self::initialize(conn)
    }

    /// An archive that only lives as long as this object.
    pub fn in_memory() -> BurnWatchResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> BurnWatchResult<Self> {
        // A 5-second busy time out is WAY too much. If we hit this something has gone terribly wrong.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        const QUERY: &str = include_str!("archive/create_archive_db.sql");
        conn.execute_batch(QUERY)?;

        Ok(SnapshotArchive { conn })
    }

    /// Add a batch and its clusters to the archive.
    ///
    /// # Returns
    /// The id of the new batch.
    pub fn add(&mut self, snapshot: &BatchSnapshot) -> BurnWatchResult<i64> {
        const ADD_BATCH_QUERY: &str = include_str!("archive/add_batch.sql");
        const ADD_CLUSTER_QUERY: &str = include_str!("archive/add_batch_cluster.sql");

        let tx = self.conn.transaction()?;

        let total_frp: f64 = snapshot.all_fires.iter().map(|f| f.frp).sum();
        let status: &'static str = snapshot.metadata.status.into();
        let severity: &'static str = snapshot.attribution.severity.into();

        tx.execute(
            ADD_BATCH_QUERY,
            [
                &snapshot.metadata.timestamp as &dyn ToSql,
                &Utc::now(),
                &snapshot.metadata.source,
                &status,
                &(snapshot.all_fires.len() as i64),
                &total_frp,
                &snapshot.attribution.total_impact,
                &snapshot.attribution.stubble_percentage,
                &severity,
            ],
        )?;
        let batch_id = tx.last_insert_rowid();

        {
            let mut add_cluster_stmt = tx.prepare(ADD_CLUSTER_QUERY)?;
            for (rank, cluster) in snapshot.clusters.iter().enumerate() {
                let severity: &'static str = cluster.severity.into();

                add_cluster_stmt.execute([
                    &batch_id as &dyn ToSql,
                    &(rank as i64),
                    &cluster.center.lat,
                    &cluster.center.lon,
                    &(cluster.fire_count as i64),
                    &cluster.total_frp,
                    &cluster.avg_confidence,
                    &severity,
                ])?;
            }
        }

        tx.commit()?;

        Ok(batch_id)
    }

    /// Get the summaries of the most recent batches, newest first.
    pub fn recent(&self, limit: usize) -> BurnWatchResult<Vec<ArchivedBatch>> {
        const QUERY: &str = include_str!("archive/query_recent_batches.sql");

        let mut stmt = self.conn.prepare(QUERY)?;
        let rows = stmt.query_map([limit as i64], ArchivedBatch::from_row)?;

        let batches = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}

/// The summary of a batch as kept in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedBatch {
    pub batch_id: i64,
    /// When the hotspots were acquired.
    pub acquired: DateTime<Utc>,
    pub source: String,
    pub status: SourceTier,
    pub fire_count: usize,
    /// Sum of the fire power of every hotspot in megawatts.
    pub total_frp: f64,
    pub total_impact: f64,
    pub stubble_percentage: f64,
    pub severity: AttributionSeverity,
    /// The number of ranked clusters stored with the batch.
    pub cluster_count: usize,
}

impl ArchivedBatch {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ArchivedBatch {
            batch_id: row.get(0)?,
            acquired: row.get(1)?,
            source: row.get(2)?,
            status: parse_column(row, 3)?,
            fire_count: row.get::<_, i64>(4)? as usize,
            total_frp: row.get(5)?,
            total_impact: row.get(6)?,
            stubble_percentage: row.get(7)?,
            severity: parse_column(row, 8)?,
            cluster_count: row.get::<_, i64>(9)? as usize,
        })
    }
}

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

impl Display for ArchivedBatch {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "          Batch: {:9}", self.batch_id)?;
        writeln!(f, "       Acquired: {}", self.acquired)?;
        writeln!(f, "         Source: {} ({})", self.source, self.status)?;
        writeln!(f, "          Fires: {}", self.fire_count)?;
        writeln!(f, "      Total FRP: {:.1} MW", self.total_frp)?;
        writeln!(f, "       Clusters: {}", self.cluster_count)?;
        write!(f,   "    Attribution: {:.1}% ({})", self.stubble_percentage, self.severity)
    }
}

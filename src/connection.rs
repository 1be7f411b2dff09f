use std::time::Duration;

use tracing::{info, warn};

use crate::config::{ConfigArgs, ConnectionConfig, load_config};
use crate::endpoints::{Database, Program, Service};
use crate::error::{Result, WqpError};
use crate::params::{DataRequest, OneOrMany, QueryParams, ResultId, data_requests};
use crate::table::{DEFAULT_DELIMITER, ResultTable};
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Version of a result set; `1` in almost all cases.
pub const DEFAULT_VERSION: i64 = 1;

/// A configured handle on one WQP database and program.
///
/// Holds no state between calls; every method issues fresh requests.
#[derive(Debug, Clone)]
pub struct Connection<T = HttpTransport> {
    database: Database,
    program: Program,
    base_url: String,
    delimiter: u8,
    transport: T,
}

/// Builder for [`Connection`]. Names are validated in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    database: String,
    program: String,
    base_url: Option<String>,
    delimiter: u8,
    transport: TransportConfig,
}

impl ConnectionBuilder {
    /// Overrides the database's default base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request timeout (default: 60 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    /// Whether to verify TLS certificates (default: true).
    pub fn verify(mut self, verify: bool) -> Self {
        self.transport.verify = verify;
        self
    }

    /// Show a progress bar during multi-request calls (default: false).
    pub fn progress(mut self, progress: bool) -> Self {
        self.transport.progress = progress;
        self
    }

    /// Field delimiter of response bodies (default: `,`).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Validates the names and builds an HTTP-backed connection.
    pub fn build(self) -> Result<Connection> {
        let transport = HttpTransport::new(&self.transport)?;
        self.build_with(transport)
    }

    /// Validates the names and builds a connection over `transport`.
    pub fn build_with<T: Transport>(self, transport: T) -> Result<Connection<T>> {
        let database: Database = self.database.parse()?;
        let program: Program = self.program.parse()?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| database.base_url().to_string());

        Ok(Connection {
            database,
            program,
            base_url,
            delimiter: self.delimiter,
            transport,
        })
    }
}

/// Outcome of a `ResultData` batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultBatch {
    /// Result sets that returned rows, in request order.
    pub tables: Vec<(ResultId, ResultTable)>,
    /// Result IDs that returned no rows for their window, in request order.
    pub empty: Vec<ResultId>,
}

impl ResultBatch {
    #[must_use]
    pub fn into_tables(self) -> Vec<ResultTable> {
        self.tables.into_iter().map(|(_, t)| t).collect()
    }
}

impl Connection {
    /// Starts a builder for `database` ("test" or "production") and
    /// `program` ("marsh" or "emp"). Names are case-insensitive.
    pub fn builder(database: impl Into<String>, program: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder {
            database: database.into(),
            program: program.into(),
            base_url: None,
            delimiter: DEFAULT_DELIMITER,
            transport: TransportConfig::default(),
        }
    }

    /// Creates a connection, failing if either name is not recognised.
    ///
    /// No request is made.
    pub fn new(database: &str, program: &str) -> Result<Self> {
        Self::builder(database, program).build()
    }

    /// Creates a connection from `WQP_DATABASE` / `WQP_PROGRAM` / `WQP_URL` /
    /// `WQP_VERIFY`, falling back to a `.wqprc` file (`WQP_RC`, the current
    /// directory, then the home directory).
    pub fn from_env() -> Result<Self> {
        Self::from_config(load_config(ConfigArgs::default())?)
    }

    /// Creates a connection from already-resolved settings.
    pub fn from_config(cfg: ConnectionConfig) -> Result<Self> {
        let mut builder =
            Self::builder(cfg.database.name(), cfg.program.name()).verify(cfg.verify);
        if let Some(url) = cfg.url {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    /// Creates a connection and fails unless the service answers.
    pub fn connect(database: &str, program: &str) -> Result<Self> {
        Self::new(database, program)?.checked()
    }
}

impl<T: Transport> Connection<T> {
    #[must_use]
    pub fn database(&self) -> Database {
        self.database
    }

    #[must_use]
    pub fn program(&self) -> Program {
        self.program
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Code sent as the `program` parameter.
    #[must_use]
    pub fn program_code(&self) -> &'static str {
        self.program.code()
    }

    /// GETs the base URL. Any failure, including an error status, is `false`.
    pub fn is_connected(&self) -> bool {
        self.transport
            .get(&self.base_url, &QueryParams::new())
            .is_ok()
    }

    /// Returns `self` if the service answers, [`WqpError::Unreachable`] otherwise.
    pub fn checked(self) -> Result<Self> {
        if !self.is_connected() {
            return Err(WqpError::Unreachable(self.base_url));
        }
        info!(
            database = %self.database,
            program = %self.program,
            "Established connection to WQP"
        );
        Ok(self)
    }

    /// Lists all result sets of the program.
    pub fn result_details(&self) -> Result<ResultTable> {
        self.service_query(Service::ResultDetails)
    }

    /// Reading dates of each result set, in the order of `result_ids`.
    pub fn result_dates(
        &self,
        result_ids: impl Into<OneOrMany<ResultId>>,
    ) -> Result<Vec<ResultTable>> {
        let param_list: Vec<QueryParams> = result_ids
            .into()
            .into_vec()
            .into_iter()
            .map(|rid| self.program_params().with("resultid", rid))
            .collect();
        self.multi_query(&Service::ResultDates.url(&self.base_url), &param_list)
    }

    /// Data of each result set between `start_times` and `end_times`.
    ///
    /// Times are `YYYY-MM-DD HH:MM:SS`. Scalars are applied to every ID; lists
    /// must match `result_ids` in length. Result sets with no rows are left
    /// out and reported in a single warning.
    pub fn result_data(
        &self,
        result_ids: impl Into<OneOrMany<ResultId>>,
        start_times: impl Into<OneOrMany<String>>,
        end_times: impl Into<OneOrMany<String>>,
        version: impl Into<OneOrMany<i64>>,
    ) -> Result<Vec<ResultTable>> {
        let batch = self.result_data_batch(result_ids, start_times, end_times, version)?;
        if !batch.empty.is_empty() {
            let ids = batch
                .empty
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            warn!(
                "Some result ids returned no data for the specified time window: {}",
                ids
            );
        }
        Ok(batch.into_tables())
    }

    /// Like [`result_data`](Self::result_data), but keeps the IDs and reports
    /// empty result sets instead of logging them.
    pub fn result_data_batch(
        &self,
        result_ids: impl Into<OneOrMany<ResultId>>,
        start_times: impl Into<OneOrMany<String>>,
        end_times: impl Into<OneOrMany<String>>,
        version: impl Into<OneOrMany<i64>>,
    ) -> Result<ResultBatch> {
        let requests = data_requests(
            result_ids.into(),
            start_times.into(),
            end_times.into(),
            version.into(),
        )?;
        let param_list: Vec<QueryParams> = requests.iter().map(|r| self.data_params(r)).collect();
        let tables = self.multi_query(&Service::ResultData.url(&self.base_url), &param_list)?;

        let mut batch = ResultBatch::default();
        for (req, table) in requests.iter().zip(tables) {
            if table.is_empty() {
                batch.empty.push(req.result_id);
            } else {
                batch.tables.push((req.result_id, table));
            }
        }
        Ok(batch)
    }

    /// Queries any catalogued endpoint with the program code.
    pub fn service_query(&self, service: Service) -> Result<ResultTable> {
        self.basic_query(&service.url(&self.base_url), &self.program_params())
    }

    /// One GET, parsed as a table.
    pub fn basic_query(&self, url: &str, params: &QueryParams) -> Result<ResultTable> {
        let text = self.basic_query_text(url, params)?;
        ResultTable::parse(&text, self.delimiter)
    }

    /// One GET, raw body.
    pub fn basic_query_text(&self, url: &str, params: &QueryParams) -> Result<String> {
        self.transport.get(url, params)
    }

    /// Concurrent GETs, each parsed as a table, in the order of `param_list`.
    pub fn multi_query(&self, url: &str, param_list: &[QueryParams]) -> Result<Vec<ResultTable>> {
        self.multi_query_text(url, param_list)?
            .iter()
            .map(|text| ResultTable::parse(text, self.delimiter))
            .collect()
    }

    /// Concurrent GETs, raw bodies in the order of `param_list`.
    pub fn multi_query_text(&self, url: &str, param_list: &[QueryParams]) -> Result<Vec<String>> {
        self.transport.get_all(url, param_list)
    }

    fn program_params(&self) -> QueryParams {
        QueryParams::new().with("program", self.program_code())
    }

    fn data_params(&self, req: &DataRequest) -> QueryParams {
        self.program_params()
            .with("resultid", req.result_id)
            .with("start", &req.start)
            .with("end", &req.end)
            .with("version", req.version)
    }
}

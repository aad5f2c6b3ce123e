//! Session lifecycle
//!
//! A [`Session`] owns a token, the resolved spreadsheet/worksheet ids, and
//! the pending [`CellGrid`]. `add` is synchronous and fails fast on caller
//! bugs; `send` and `receive` are single request/response exchanges through
//! the [`Transport`] collaborator. `send` is one logical transaction:
//! resolve, serialize, transmit, and only on success reset the grid, so a
//! failed batch can be retried as-is.

use quick_xml::escape::escape;

use gridfeed_core::{BatchInput, CellGrid};
use gridfeed_wire::{
    batch_failed, compile_grid, find_feed_entry_id, parse_cell_feed, Author, RowMap,
};

use crate::auth::{AccessToken, Realm, TokenSource};
use crate::error::{ClientError, ClientResult, SheetKind};
use crate::transport::{HttpRequest, Transport};

const FEED_HOST: &str = "spreadsheets.google.com";
const DOCS_FEED_URL: &str = "https://docs.google.com/feeds/default/private/full?alt=json";

/// Options for [`Session::connect`].
///
/// Each of spreadsheet and worksheet needs an id or a name; ids skip the
/// list-feed lookup entirely.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_name: Option<String>,
    pub worksheet_id: Option<String>,
    pub worksheet_name: Option<String>,
    pub use_https: bool,
    /// Create the spreadsheet when the by-name lookup finds nothing.
    pub create_if_missing: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            spreadsheet_name: None,
            worksheet_id: None,
            worksheet_name: None,
            use_https: true,
            create_if_missing: false,
        }
    }
}

impl SessionOptions {
    fn validate(&self) -> ClientResult<()> {
        if self.spreadsheet_id.is_none() && self.spreadsheet_name.is_none() {
            return Err(ClientError::Config(
                "'spreadsheet_id' or 'spreadsheet_name' is required".to_string(),
            ));
        }
        if self.worksheet_id.is_none() && self.worksheet_name.is_none() {
            return Err(ClientError::Config(
                "'worksheet_id' or 'worksheet_name' is required".to_string(),
            ));
        }
        // A freshly created spreadsheet has a single worksheet named
        // "Sheet 1", so resolving any other name afterwards cannot succeed.
        if self.create_if_missing
            && self.worksheet_id.is_none()
            && self.worksheet_name.as_deref() != Some("Sheet 1")
        {
            return Err(ClientError::Config(
                "worksheet must be named 'Sheet 1' when creating a new spreadsheet".to_string(),
            ));
        }
        Ok(())
    }

    fn protocol(&self) -> &'static str {
        if self.use_https {
            "https"
        } else {
            "http"
        }
    }
}

/// Metadata returned alongside the row map by [`Session::receive`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetInfo {
    pub spreadsheet_id: String,
    pub worksheet_id: String,
    pub title: Option<String>,
    pub updated: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub authors: Vec<Author>,
    pub total_cells: usize,
    pub total_rows: usize,
    pub last_row: u32,
    pub next_row: u32,
}

/// A connected session against one worksheet.
pub struct Session<T: Transport> {
    transport: T,
    token: AccessToken,
    protocol: &'static str,
    spreadsheet_id: String,
    worksheet_id: String,
    grid: CellGrid,
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The transport is opaque and the token secret must not leak.
        f.debug_struct("Session")
            .field("protocol", &self.protocol)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet_id", &self.worksheet_id)
            .field("pending", &self.grid.len())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Session<T> {
    /// Build a session from already-known ids, skipping discovery.
    pub fn new(
        transport: T,
        token: AccessToken,
        spreadsheet_id: impl Into<String>,
        worksheet_id: impl Into<String>,
        use_https: bool,
    ) -> Self {
        Self {
            transport,
            token,
            protocol: if use_https { "https" } else { "http" },
            spreadsheet_id: spreadsheet_id.into(),
            worksheet_id: worksheet_id.into(),
            grid: CellGrid::new(),
        }
    }

    /// Authenticate and resolve names to ids.
    ///
    /// With `create_if_missing`, a spreadsheet that cannot be found is
    /// created through the documents service (which issues its own token
    /// realm) and resolution is retried once.
    pub async fn connect<S>(
        options: SessionOptions,
        tokens: &S,
        transport: T,
    ) -> ClientResult<Self>
    where
        S: TokenSource + ?Sized,
    {
        options.validate()?;

        tracing::debug!("logging into spreadsheets API");
        let token = tokens.fetch(Realm::Spreadsheets).await?;
        let protocol = options.protocol();

        let resolved = resolve_ids(&transport, &token, &options).await;
        let (spreadsheet_id, worksheet_id) = match resolved {
            Ok(ids) => ids,
            Err(ClientError::NotFound {
                kind: SheetKind::Spreadsheet,
                name,
            }) if options.create_if_missing => {
                tracing::info!("spreadsheet '{name}' not found, creating it");
                let docs_token = tokens.fetch(Realm::Docs).await?;
                create_spreadsheet(&transport, &docs_token, &name).await?;
                tracing::info!("new spreadsheet successfully created");
                resolve_ids(&transport, &token, &options).await?
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            transport,
            token,
            protocol,
            spreadsheet_id,
            worksheet_id,
            grid: CellGrid::new(),
        })
    }

    /// The cell feed URL this session reads and writes.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{FEED_HOST}/feeds/cells/{}/{}/private/full",
            self.protocol, self.spreadsheet_id, self.worksheet_id
        )
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn worksheet_id(&self) -> &str {
        &self.worksheet_id
    }

    /// Pending cells accumulated since the last successful send.
    pub fn pending(&self) -> &CellGrid {
        &self.grid
    }

    /// Queue cells for the next send. Fails fast on a duplicate symbolic
    /// name; that is a caller bug, not a remote condition.
    pub fn add(&mut self, input: impl Into<BatchInput>) -> ClientResult<()> {
        self.grid.add(input).map_err(Into::into)
    }

    /// Queue dynamically shaped JSON input.
    pub fn add_json(&mut self, value: serde_json::Value) -> ClientResult<()> {
        self.grid.add(BatchInput::from_json(value)?).map_err(Into::into)
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Authorization".to_string(), self.token.authorization_value()),
            ("Content-Type".to_string(), "application/atom+xml".to_string()),
            ("GData-Version".to_string(), "3.0".to_string()),
            ("If-Match".to_string(), "*".to_string()),
        ]
    }

    /// Resolve references, serialize the pending grid, and POST the batch.
    ///
    /// On success the grid is cleared; on any failure it is left untouched
    /// so the caller may retry.
    pub async fn send(&mut self) -> ClientResult<()> {
        let base_url = self.base_url();
        let body = compile_grid(&self.grid, &base_url);

        tracing::debug!(pending = self.grid.len(), "updating spreadsheet");
        let response = self
            .transport
            .execute(HttpRequest::post(
                format!("{base_url}/batch"),
                self.headers(),
                body,
            ))
            .await?;

        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                body: response.body,
            });
        }
        if let Some(reason) = batch_failed(&response.body) {
            tracing::warn!("batch update failed: {reason}");
            return Err(ClientError::RemoteBatch(reason));
        }

        tracing::info!("successfully updated spreadsheet");
        self.grid.reset();
        Ok(())
    }

    /// Fetch the whole worksheet as a row/column value map plus metadata.
    pub async fn receive(&self) -> ClientResult<(RowMap, WorksheetInfo)> {
        let response = self
            .transport
            .execute(HttpRequest::get(
                format!("{}?alt=json", self.base_url()),
                self.headers(),
            ))
            .await?;

        if response.status != 200 {
            return Err(ClientError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let snapshot = parse_cell_feed(&response.body)?;
        tracing::debug!(
            cells = snapshot.total_cells,
            rows = snapshot.total_rows,
            "retrieved worksheet"
        );

        let info = WorksheetInfo {
            spreadsheet_id: self.spreadsheet_id.clone(),
            worksheet_id: self.worksheet_id.clone(),
            title: snapshot.title,
            updated: snapshot.updated,
            authors: snapshot.authors,
            total_cells: snapshot.total_cells,
            total_rows: snapshot.total_rows,
            last_row: snapshot.last_row,
            next_row: snapshot.next_row,
        };
        Ok((snapshot.rows, info))
    }
}

/// Resolve spreadsheet then worksheet ids through the list feeds.
async fn resolve_ids<T: Transport>(
    transport: &T,
    token: &AccessToken,
    options: &SessionOptions,
) -> ClientResult<(String, String)> {
    let protocol = options.protocol();

    let spreadsheet_id = match &options.spreadsheet_id {
        Some(id) => id.clone(),
        None => {
            let name = options
                .spreadsheet_name
                .as_deref()
                .ok_or_else(|| ClientError::Config("'spreadsheet_name' is required".to_string()))?;
            lookup_id(
                transport,
                token,
                format!("{protocol}://{FEED_HOST}/feeds/spreadsheets/private/full?alt=json"),
                name,
                SheetKind::Spreadsheet,
            )
            .await?
        }
    };

    let worksheet_id = match &options.worksheet_id {
        Some(id) => id.clone(),
        None => {
            let name = options
                .worksheet_name
                .as_deref()
                .ok_or_else(|| ClientError::Config("'worksheet_name' is required".to_string()))?;
            lookup_id(
                transport,
                token,
                format!(
                    "{protocol}://{FEED_HOST}/feeds/worksheets/{spreadsheet_id}/private/full?alt=json"
                ),
                name,
                SheetKind::Worksheet,
            )
            .await?
        }
    };

    Ok((spreadsheet_id, worksheet_id))
}

async fn lookup_id<T: Transport>(
    transport: &T,
    token: &AccessToken,
    url: String,
    name: &str,
    kind: SheetKind,
) -> ClientResult<String> {
    tracing::debug!("searching for {kind} '{name}'");
    let headers = vec![
        ("Authorization".to_string(), token.authorization_value()),
        ("GData-Version".to_string(), "3.0".to_string()),
    ];
    let response = transport.execute(HttpRequest::get(url, headers)).await?;
    if response.status != 200 {
        return Err(ClientError::Status {
            status: response.status,
            body: response.body,
        });
    }

    match find_feed_entry_id(&response.body, name)? {
        Some(id) => {
            tracing::info!("tip: pass the {kind} id '{id}' directly for improved performance");
            Ok(id)
        }
        None => Err(ClientError::NotFound {
            kind,
            name: name.to_string(),
        }),
    }
}

/// POST the Atom creation entry to the documents feed.
async fn create_spreadsheet<T: Transport>(
    transport: &T,
    docs_token: &AccessToken,
    name: &str,
) -> ClientResult<()> {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <entry xmlns=\"http://www.w3.org/2005/Atom\" \
         xmlns:docs=\"http://schemas.google.com/docs/2007\">\
         <category scheme=\"http://schemas.google.com/docs/2007#spreadsheet\" \
         term=\"http://schemas.google.com/docs/2007#spreadsheet\"/>\
         <title>{}</title>\
         </entry>",
        escape(name)
    );
    let headers = vec![
        ("Authorization".to_string(), docs_token.authorization_value()),
        ("Content-Type".to_string(), "application/atom+xml".to_string()),
        ("GData-Version".to_string(), "3.0".to_string()),
    ];

    let response = transport
        .execute(HttpRequest::post(DOCS_FEED_URL, headers, body))
        .await?;
    if !response.is_success() {
        return Err(ClientError::CreateFailed(response.body));
    }

    // The documents service echoes the new resource as an `entry`.
    let parsed: serde_json::Value = serde_json::from_str(&response.body)
        .map_err(|_| ClientError::CreateFailed(response.body.clone()))?;
    if parsed.get("entry").is_none() {
        return Err(ClientError::CreateFailed(response.body));
    }
    Ok(())
}

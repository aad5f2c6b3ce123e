//! Session lifecycle against a scripted transport.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use gridfeed::{
    AccessToken, AuthError, CellValue, ClientError, HttpRequest, HttpResponse, Method, Realm,
    Session, SessionOptions, SheetKind, StaticToken, TokenSource, Transport, TransportError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// A transport scripted with (method, url substring) -> response steps.
/// Each step is consumed once; unmatched requests fail the exchange.
struct ScriptedTransport {
    steps: Mutex<VecDeque<(Method, &'static str, HttpResponse)>>,
    log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<(Method, &'static str, HttpResponse)>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            log: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl<'a> Transport for &'a ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        let mut steps = self.steps.lock().unwrap();
        let position = steps
            .iter()
            .position(|(method, fragment, _)| *method == request.method && request.url.contains(fragment))
            .ok_or_else(|| TransportError(format!("unscripted request: {}", request.url)))?;
        Ok(steps.remove(position).unwrap().2)
    }
}

fn list_feed(entries: &[(&str, &str)]) -> String {
    let entries: Vec<_> = entries
        .iter()
        .map(|(title, id_url)| json!({ "title": { "$t": title }, "id": { "$t": id_url } }))
        .collect();
    json!({ "feed": { "entry": entries } }).to_string()
}

fn cell_feed(cells: &[(u32, u32, &str)]) -> String {
    let entries: Vec<_> = cells
        .iter()
        .map(|(row, col, value)| {
            json!({ "gs$cell": { "row": row.to_string(), "col": col.to_string(), "$t": value } })
        })
        .collect();
    json!({
        "feed": {
            "title": { "$t": "Sheet 1" },
            "entry": entries,
        }
    })
    .to_string()
}

fn named_options() -> SessionOptions {
    SessionOptions {
        spreadsheet_name: Some("Budget".to_string()),
        worksheet_name: Some("Sheet 1".to_string()),
        ..Default::default()
    }
}

fn tokens() -> StaticToken {
    StaticToken(AccessToken::bearer("tok"))
}

#[tokio::test]
async fn connect_resolves_ids_by_name() {
    let transport = ScriptedTransport::new(vec![
        (
            Method::Get,
            "/feeds/spreadsheets/private/full",
            HttpResponse::ok(list_feed(&[
                ("Other", "https://x/feeds/full/zzz"),
                ("Budget", "https://x/feeds/full/SPREAD1"),
            ])),
        ),
        (
            Method::Get,
            "/feeds/worksheets/SPREAD1/private/full",
            HttpResponse::ok(list_feed(&[("Sheet 1", "https://x/feeds/full/od6")])),
        ),
    ]);

    let session = Session::connect(named_options(), &tokens(), &transport)
        .await
        .unwrap();
    assert_eq!(session.spreadsheet_id(), "SPREAD1");
    assert_eq!(session.worksheet_id(), "od6");

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
}

#[tokio::test]
async fn connect_skips_lookup_when_ids_given() {
    let transport = ScriptedTransport::new(vec![]);
    let options = SessionOptions {
        spreadsheet_id: Some("SID".to_string()),
        worksheet_id: Some("WID".to_string()),
        ..Default::default()
    };
    let session = Session::connect(options, &tokens(), &transport).await.unwrap();
    assert_eq!(session.base_url(), "https://spreadsheets.google.com/feeds/cells/SID/WID/private/full");
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn connect_reports_missing_worksheet() {
    let transport = ScriptedTransport::new(vec![
        (
            Method::Get,
            "/feeds/spreadsheets/private/full",
            HttpResponse::ok(list_feed(&[("Budget", "https://x/feeds/full/SPREAD1")])),
        ),
        (
            Method::Get,
            "/feeds/worksheets/SPREAD1/private/full",
            HttpResponse::ok(list_feed(&[])),
        ),
    ]);

    let err = Session::connect(named_options(), &tokens(), &transport)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::NotFound { kind: SheetKind::Worksheet, name } if name == "Sheet 1"
    ));
}

#[tokio::test]
async fn connect_validates_options_before_any_request() {
    let transport = ScriptedTransport::new(vec![]);
    let err = Session::connect(SessionOptions::default(), &tokens(), &transport)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
    assert!(transport.requests().is_empty());
}

/// A source that hands out distinct tokens per realm, so the creation flow's
/// separate docs login is observable.
struct PerRealmTokens;

#[async_trait]
impl TokenSource for PerRealmTokens {
    async fn fetch(&self, realm: Realm) -> Result<AccessToken, AuthError> {
        Ok(match realm {
            Realm::Spreadsheets => AccessToken::bearer("sheets-tok"),
            Realm::Docs => AccessToken::google_login("docs-tok"),
        })
    }
}

#[tokio::test]
async fn connect_creates_missing_spreadsheet_when_opted_in() {
    let transport = ScriptedTransport::new(vec![
        (
            Method::Get,
            "/feeds/spreadsheets/private/full",
            HttpResponse::ok(list_feed(&[])),
        ),
        (
            Method::Post,
            "docs.google.com/feeds/default/private/full",
            HttpResponse::ok(json!({ "entry": { "id": { "$t": "new" } } }).to_string()),
        ),
        (
            Method::Get,
            "/feeds/spreadsheets/private/full",
            HttpResponse::ok(list_feed(&[("Budget", "https://x/feeds/full/NEW1")])),
        ),
        (
            Method::Get,
            "/feeds/worksheets/NEW1/private/full",
            HttpResponse::ok(list_feed(&[("Sheet 1", "https://x/feeds/full/od6")])),
        ),
    ]);

    let options = SessionOptions {
        create_if_missing: true,
        ..named_options()
    };
    let session = Session::connect(options, &PerRealmTokens, &transport)
        .await
        .unwrap();
    assert_eq!(session.spreadsheet_id(), "NEW1");

    let requests = transport.requests();
    let create = &requests[1];
    assert_eq!(
        create.header("Authorization"),
        Some("GoogleLogin auth=docs-tok")
    );
    let body = create.body.as_deref().unwrap();
    assert!(body.contains("<title>Budget</title>"));
    assert!(body.contains("docs/2007#spreadsheet"));
}

#[tokio::test]
async fn connect_without_create_surfaces_not_found() {
    let transport = ScriptedTransport::new(vec![(
        Method::Get,
        "/feeds/spreadsheets/private/full",
        HttpResponse::ok(list_feed(&[])),
    )]);

    let err = Session::connect(named_options(), &tokens(), &transport)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::NotFound { kind: SheetKind::Spreadsheet, .. }
    ));
}

fn connected(transport: &ScriptedTransport) -> Session<&ScriptedTransport> {
    Session::new(transport, AccessToken::bearer("tok"), "SID", "WID", true)
}

#[tokio::test]
async fn send_success_clears_the_grid() {
    let transport = ScriptedTransport::new(vec![(
        Method::Post,
        "/feeds/cells/SID/WID/private/full/batch",
        HttpResponse::ok("<feed><entry><batch:status code=\"200\" reason=\"Success\"/></entry></feed>"),
    )]);

    let mut session = connected(&transport);
    session
        .add(vec![vec![CellValue::from("a"), CellValue::from(2)]])
        .unwrap();
    assert_eq!(session.pending().len(), 2);

    session.send().await.unwrap();
    assert!(session.pending().is_empty());

    let requests = transport.requests();
    let body = requests[0].body.as_deref().unwrap();
    assert!(body.contains("UpdateR1C1"));
    assert!(body.contains("UpdateR1C2"));
    assert_eq!(requests[0].header("If-Match"), Some("*"));
}

#[tokio::test]
async fn send_failure_preserves_the_grid_for_retry() {
    let transport = ScriptedTransport::new(vec![
        (
            Method::Post,
            "/batch",
            HttpResponse::ok("<feed><entry><batch:status success='0' reason=\"Conflict\"/></entry></feed>"),
        ),
        (
            Method::Post,
            "/batch",
            HttpResponse::ok("<feed><entry><batch:status code=\"200\"/></entry></feed>"),
        ),
    ]);

    let mut session = connected(&transport);
    session.add(vec![CellValue::from("keep me")]).unwrap();

    let err = session.send().await.unwrap_err();
    assert!(matches!(err, ClientError::RemoteBatch(reason) if reason == "Conflict"));
    assert_eq!(session.pending().len(), 1);

    // The retry transmits the same pending cell and clears it.
    session.send().await.unwrap();
    assert!(session.pending().is_empty());

    let bodies: Vec<_> = transport
        .requests()
        .iter()
        .map(|r| r.body.clone().unwrap())
        .collect();
    assert!(bodies[0].contains("UpdateR1C1"));
    assert!(bodies[1].contains("UpdateR1C1"));
}

#[tokio::test]
async fn send_transport_status_error_preserves_the_grid() {
    let transport = ScriptedTransport::new(vec![(
        Method::Post,
        "/batch",
        HttpResponse {
            status: 403,
            body: "Forbidden".to_string(),
        },
    )]);

    let mut session = connected(&transport);
    session.add(vec![CellValue::from(1)]).unwrap();

    let err = session.send().await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 403, .. }));
    assert_eq!(session.pending().len(), 1);
}

#[tokio::test]
async fn send_on_empty_grid_posts_an_empty_envelope() {
    let transport = ScriptedTransport::new(vec![(
        Method::Post,
        "/batch",
        HttpResponse::ok("<feed/>"),
    )]);

    let mut session = connected(&transport);
    session.send().await.unwrap();
    assert!(session.pending().is_empty());

    let body = transport.requests()[0].body.clone().unwrap();
    assert!(body.starts_with("<feed"));
    assert!(!body.contains("<entry>"));
}

#[tokio::test]
async fn receive_returns_rows_and_metadata() {
    let transport = ScriptedTransport::new(vec![(
        Method::Get,
        "/feeds/cells/SID/WID/private/full?alt=json",
        HttpResponse::ok(cell_feed(&[(2, 1, "a"), (2, 2, "b"), (3, 1, "c")])),
    )]);

    let session = connected(&transport);
    let (rows, info) = session.receive().await.unwrap();

    assert_eq!(rows[&2][&1].value, CellValue::Text("a".to_string()));
    assert_eq!(info.spreadsheet_id, "SID");
    assert_eq!(info.worksheet_id, "WID");
    assert_eq!(info.title.as_deref(), Some("Sheet 1"));
    assert_eq!(info.total_cells, 3);
    assert_eq!(info.total_rows, 2);
    assert_eq!(info.last_row, 3);
    assert_eq!(info.next_row, 4);
}

#[tokio::test]
async fn receive_empty_worksheet_defaults() {
    let transport = ScriptedTransport::new(vec![(
        Method::Get,
        "?alt=json",
        HttpResponse::ok(cell_feed(&[])),
    )]);

    let session = connected(&transport);
    let (rows, info) = session.receive().await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(info.total_rows, 0);
    assert_eq!(info.last_row, 1);
    assert_eq!(info.next_row, 1);
}

#[tokio::test]
async fn receive_surfaces_error_bodies() {
    let transport = ScriptedTransport::new(vec![(
        Method::Get,
        "?alt=json",
        HttpResponse {
            status: 401,
            body: "Token expired".to_string(),
        },
    )]);

    let session = connected(&transport);
    let err = session.receive().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status { status: 401, body } if body == "Token expired"
    ));
}

#[tokio::test]
async fn receive_rejects_feedless_json() {
    let transport = ScriptedTransport::new(vec![(
        Method::Get,
        "?alt=json",
        HttpResponse::ok("{\"not_a_feed\": true}"),
    )]);

    let session = connected(&transport);
    let err = session.receive().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Wire(gridfeed::WireError::Retrieval(_))
    ));
}

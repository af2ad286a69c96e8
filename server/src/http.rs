//! HTTP-Router des Servers
//!
//! ```text
//! /            Statusseite (HTML)
//! /health      JSON-Status
//! /metrics     Prometheus (optional)
//! /ws          WebSocket-Signaling
//! /socket.io/  WebSocket-Signaling (Alias)
//! /*           statische Dateien aus `daten_pfad` (optional)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use lobbyfunk_observability::health::anfrage_adresse;
use lobbyfunk_observability::{
    health_router, metrics_router, metriken_middleware, request_timing_layer, timing_middleware,
    LobbyfunkMetrics, StatusQuelle,
};
use lobbyfunk_signaling::{signaling_router, SignalingState};
use minijinja::{context, AutoEscape, Environment};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

/// Wert des HSTS-Headers bei aktivem TLS
pub const HSTS_WERT: &str = "max-age=63072000; includeSubDomains";

/// Name der optionalen Statusseiten-Vorlage in `daten_pfad`
pub const VORLAGE_DATEI: &str = "index.html";

/// Eingebaute Statusseite; Variablen: `name`, `address`, `connected`
const STANDARD_VORLAGE: &str = r#"<!DOCTYPE html>
<html lang="de">
<head>
<meta charset="utf-8">
<title>{{ name }}</title>
</head>
<body>
<h1>{{ name }}</h1>
<p>Server-Adresse: <code>{{ address }}</code></p>
<p>Verbundene Clients: {{ connected }}</p>
</body>
</html>
"#;

/// Alles, was der Router zum Aufbau braucht
pub struct HttpKontext {
    pub signaling: SignalingState,
    pub metriken: Option<LobbyfunkMetrics>,
    pub tls: bool,
    pub daten_pfad: Option<PathBuf>,
    pub anfragen_protokollieren: bool,
}

#[derive(Clone)]
struct StatusSeite {
    quelle: Arc<dyn StatusQuelle>,
    vorlagen: Arc<Environment<'static>>,
    tls: bool,
}

/// Baut den vollstaendigen Router
pub fn router_bauen(kontext: HttpKontext) -> Router {
    let quelle: Arc<dyn StatusQuelle> = kontext.signaling.koordinator.clone();
    let seite = StatusSeite {
        quelle: Arc::clone(&quelle),
        vorlagen: Arc::new(vorlagen_laden(kontext.daten_pfad.as_ref())),
        tls: kontext.tls,
    };

    let mut router = Router::new()
        .route("/", get(status_seite))
        .with_state(seite)
        .merge(signaling_router(kontext.signaling))
        .merge(health_router(quelle, kontext.tls));

    if let Some(pfad) = &kontext.daten_pfad {
        router = router.fallback_service(ServeDir::new(pfad));
    }

    if let Some(metriken) = kontext.metriken {
        router = router
            .merge(metrics_router(metriken.clone()))
            .layer(middleware::from_fn_with_state(metriken, metriken_middleware));
    }

    if kontext.tls {
        router = router.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_WERT),
        ));
    }

    if kontext.anfragen_protokollieren {
        router = router.layer(middleware::from_fn(timing_middleware));
    }

    router.layer(request_timing_layer())
}

/// Vorlagen-Umgebung mit HTML-Escaping fuer alle Vorlagen.
///
/// Eine eigene `index.html` aus `daten_pfad` ersetzt die eingebaute Seite;
/// ist sie unlesbar oder fehlerhaft, bleibt die eingebaute.
fn vorlagen_laden(daten_pfad: Option<&PathBuf>) -> Environment<'static> {
    let mut umgebung = Environment::new();
    umgebung.set_auto_escape_callback(|_| AutoEscape::Html);

    if let Some(pfad) = daten_pfad.map(|p| p.join(VORLAGE_DATEI)) {
        if let Ok(quelle) = std::fs::read_to_string(&pfad) {
            match umgebung.add_template_owned(VORLAGE_DATEI, quelle) {
                Ok(()) => {
                    tracing::info!(pfad = %pfad.display(), "Eigene Statusseite geladen");
                    return umgebung;
                }
                Err(e) => {
                    tracing::warn!(pfad = %pfad.display(), fehler = %e, "Eigene Statusseite fehlerhaft, nutze eingebaute");
                }
            }
        }
    }

    if let Err(e) = umgebung.add_template(VORLAGE_DATEI, STANDARD_VORLAGE) {
        tracing::error!(fehler = %e, "Eingebaute Statusseite nicht ladbar");
    }
    umgebung
}

/// `GET /`
async fn status_seite(State(seite): State<StatusSeite>, headers: HeaderMap) -> Response {
    let status = seite.quelle.status();
    let adresse = anfrage_adresse(seite.tls, &headers);

    let gerendert = seite.vorlagen.get_template(VORLAGE_DATEI).and_then(|vorlage| {
        vorlage.render(context! {
            name => status.name,
            address => adresse,
            connected => status.verbindungen,
        })
    });

    match gerendert {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(fehler = %e, "Statusseite konnte nicht gerendert werden");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Die Statusseite konnte nicht erstellt werden.",
            )
                .into_response()
        }
    }
}

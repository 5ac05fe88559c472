//! WebSocket connection lifecycle: admission, read loop, teardown.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use frontdesk_conversations::HelpdeskEvent;
use frontdesk_realtime::wire::{events, topic};
use frontdesk_realtime::{Client, ClientRole, ConnectParams, Envelope};
use frontdesk_store::CreateContactRequest;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;
use crate::websocket::handlers;

/// Connection admission parameters, passed on the upgrade query string.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// `agent` or `contact`. Required.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Agent identity.
    pub user_id: Option<i64>,
    /// Contact identity; absent means "create an anonymous contact now".
    pub contact_id: Option<i64>,
    /// Required for contacts: the inbox the widget is embedded in.
    pub inbox_id: Option<i64>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, query: ConnectQuery) {
    let (mut ws_sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Envelope>(state.send_buffer);

    // The single writer task per connection: draining the queue in order is
    // what keeps this client's frames from interleaving.
    let sender_task = tokio::spawn(async move {
        while let Some(envelope) = out_rx.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(err) => error!(?err, "failed to serialize outbound envelope"),
            }
        }
        let _ = ws_sender.close().await;
    });

    let client = match admit(&state, &query, out_tx.clone()).await {
        Ok(client) => client,
        Err(err) => {
            // Refused: one error frame, then the socket closes. No client
            // was registered.
            warn!(%err, "connection refused");
            let _ = out_tx.send(Envelope::error(err.code(), err.to_string())).await;
            drop(out_tx);
            let _ = sender_task.await;
            return;
        }
    };
    drop(out_tx);

    let hello = Envelope::new(
        events::CONNECTION_ESTABLISHED,
        json!({
            "client_id": client.id().to_string(),
            "role": client.role().as_str(),
            "company_id": client.company_id(),
            "user_id": client.user_id(),
            "contact_id": client.contact_id(),
        }),
    );
    let _ = client.send(hello);

    // The read loop is the connection's only blocking point. A malformed
    // frame answers with an error and keeps reading; a transport error is
    // fatal to this connection only.
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(&text) {
                Ok(frame) => {
                    if let Err(err) = handlers::handle_frame(&state, &client, frame).await {
                        debug!(client_id = %client.id(), %err, "frame rejected");
                        let _ = client.send(Envelope::error(err.code(), err.to_string()));
                    }
                }
                Err(err) => {
                    let _ = client.send(Envelope::error(
                        "invalid_payload",
                        format!("undecodable frame: {err}"),
                    ));
                }
            },
            Ok(Message::Close(_)) => {
                debug!(client_id = %client.id(), "client closed connection");
                break;
            }
            Err(err) => {
                debug!(client_id = %client.id(), %err, "websocket read error");
                break;
            }
            _ => {}
        }
    }

    state.hub.disconnect(client.id()).await;
    sender_task.abort();
    info!(client_id = %client.id(), "connection finished");
}

/// Resolve identities from the query string and register the client.
///
/// Agents need a known `user_id`; their inbox scope is computed here.
/// Contacts need an `inbox_id` for tenant context; a missing `contact_id`
/// creates an anonymous contact on the spot.
pub(crate) async fn admit(
    state: &GatewayState,
    query: &ConnectQuery,
    sender: mpsc::Sender<Envelope>,
) -> GatewayResult<Arc<Client>> {
    let role = match query.kind.as_deref() {
        Some("agent") => ClientRole::Agent,
        Some("contact") => ClientRole::Contact,
        Some(other) => {
            return Err(GatewayError::admission_refused(format!(
                "unknown connection type: {other}"
            )))
        }
        None => return Err(GatewayError::admission_refused("missing connection type")),
    };

    match role {
        ClientRole::Agent => {
            let user_id = query
                .user_id
                .ok_or_else(|| GatewayError::admission_refused("agent connections require user_id"))?;
            let user = state
                .users
                .get(user_id)
                .await?
                .ok_or_else(|| GatewayError::admission_refused("unknown user"))?;
            let inbox_ids = state.inboxes.inbox_ids_for_agent(user_id).await?;

            let client = state
                .hub
                .connect(
                    ConnectParams {
                        role,
                        company_id: user.company_id,
                        user_id: Some(user_id),
                        contact_id: None,
                        inbox_ids,
                    },
                    sender,
                )
                .await
                .map_err(|err| GatewayError::admission_refused(err.to_string()))?;

            state
                .hub
                .subscribe(&client, &topic::company(user.company_id))
                .await;
            state.hub.subscribe(&client, &topic::user(user_id)).await;

            state
                .dispatcher
                .dispatch(HelpdeskEvent::UserLoggedIn {
                    company_id: user.company_id,
                    user_id,
                })
                .await;

            Ok(client)
        }
        ClientRole::Contact => {
            let inbox_id = query.inbox_id.ok_or_else(|| {
                GatewayError::admission_refused("contact connections require inbox_id")
            })?;
            let inbox = state
                .inboxes
                .get(inbox_id)
                .await?
                .ok_or_else(|| GatewayError::admission_refused("unknown inbox"))?;

            let contact = match query.contact_id {
                Some(contact_id) => state
                    .contacts
                    .get(contact_id)
                    .await?
                    .ok_or_else(|| GatewayError::admission_refused("unknown contact"))?,
                None => {
                    let created = state
                        .contacts
                        .create(&CreateContactRequest {
                            company_id: inbox.company_id,
                            ..CreateContactRequest::default()
                        })
                        .await?;
                    state
                        .dispatcher
                        .dispatch(HelpdeskEvent::ContactCreated {
                            contact: created.clone(),
                        })
                        .await;
                    created
                }
            };

            if contact.company_id != inbox.company_id {
                return Err(GatewayError::admission_refused(
                    "contact does not belong to this inbox's company",
                ));
            }

            let client = state
                .hub
                .connect(
                    ConnectParams {
                        role,
                        company_id: inbox.company_id,
                        user_id: None,
                        contact_id: Some(contact.id),
                        inbox_ids: vec![inbox_id],
                    },
                    sender,
                )
                .await
                .map_err(|err| GatewayError::admission_refused(err.to_string()))?;

            state
                .hub
                .subscribe(&client, &topic::contact(contact.id))
                .await;

            Ok(client)
        }
    }
}

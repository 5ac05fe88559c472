//! Inbound frame routing.
//!
//! One function per wire event. Domain errors come back as typed
//! `connection_error` frames to the offending client only; nothing here
//! touches other connections.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use frontdesk_conversations::Participant;
use frontdesk_realtime::wire::{events, topic};
use frontdesk_realtime::{Client, ClientRole, Envelope};
use frontdesk_store::{Conversation, SenderType};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

pub async fn handle_frame(
    state: &GatewayState,
    client: &Arc<Client>,
    frame: Envelope,
) -> GatewayResult<()> {
    match frame.event.as_str() {
        events::CONVERSATION_START => conversation_start(state, client, frame.payload).await,
        events::CONVERSATION_SEND_MESSAGE => send_message(state, client, frame.payload).await,
        events::CONVERSATION_GET_BY_ID => get_by_id(state, client, frame.payload).await,
        events::CONVERSATION_TYPING => typing(state, client, frame.payload, true).await,
        events::CONVERSATION_TYPING_STOP => typing(state, client, frame.payload, false).await,
        events::CONVERSATION_CLOSE => close(state, client, frame.payload).await,
        events::SUBSCRIBE => subscribe(state, client, frame.payload).await,
        events::UNSUBSCRIBE => unsubscribe(state, client, frame.payload).await,
        other => Err(GatewayError::UnknownEvent {
            event: other.to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct StartPayload {
    #[serde(default)]
    inbox_id: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationPayload {
    conversation_id: i64,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    conversation_id: i64,
    content: String,
}

#[derive(Debug, Deserialize)]
struct TopicPayload {
    topic: String,
}

fn decode<T: DeserializeOwned>(payload: serde_json::Value) -> GatewayResult<T> {
    serde_json::from_value(payload).map_err(|err| GatewayError::invalid_payload(err.to_string()))
}

async fn conversation_start(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
) -> GatewayResult<()> {
    let payload: StartPayload = decode(payload)?;

    let contact_id = client
        .contact_id()
        .ok_or_else(|| GatewayError::access_denied("only contacts start conversations"))?;

    // Contacts connect against exactly one inbox; a payload inbox_id may
    // only restate it.
    let connected_inbox = client
        .inbox_ids()
        .await
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::access_denied("connection has no inbox context"))?;
    let inbox_id = payload.inbox_id.unwrap_or(connected_inbox);
    if inbox_id != connected_inbox {
        return Err(GatewayError::access_denied(
            "cannot start a conversation on another inbox",
        ));
    }

    let conversation = state
        .conversations
        .start_conversation(contact_id, inbox_id, payload.message)
        .await?;

    state
        .hub
        .subscribe(client, &topic::conversation(conversation.id))
        .await;

    // Direct acknowledgement; the topic broadcast may have raced the
    // subscription above.
    let _ = client.send(Envelope::new(
        events::CONVERSATION_STARTED,
        json!({ "conversation": conversation }),
    ));
    Ok(())
}

async fn send_message(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
) -> GatewayResult<()> {
    let payload: SendMessagePayload = decode(payload)?;
    require_conversation_access(state, client, payload.conversation_id).await?;

    let (sender_type, sender_id) = match client.role() {
        ClientRole::Agent => (SenderType::Agent, client.user_id()),
        ClientRole::Contact => (SenderType::Contact, client.contact_id()),
    };

    state
        .conversations
        .send_message(
            payload.conversation_id,
            sender_type,
            sender_id,
            payload.content,
        )
        .await?;
    Ok(())
}

async fn get_by_id(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
) -> GatewayResult<()> {
    let payload: ConversationPayload = decode(payload)?;
    require_conversation_access(state, client, payload.conversation_id).await?;

    let details = state
        .conversations
        .get_with_relations(payload.conversation_id)
        .await?;

    let _ = client.send(Envelope::new(
        events::CONVERSATION_GET_BY_ID,
        json!({
            "conversation": details.conversation,
            "contact": details.contact,
            "inbox": details.inbox,
            "messages": details.messages,
        }),
    ));
    Ok(())
}

async fn typing(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
    started: bool,
) -> GatewayResult<()> {
    let payload: ConversationPayload = decode(payload)?;
    require_conversation_access(state, client, payload.conversation_id).await?;

    let actor = match client.role() {
        ClientRole::Agent => Participant::Agent {
            user_id: client.user_id().unwrap_or_default(),
        },
        ClientRole::Contact => Participant::Contact {
            contact_id: client.contact_id().unwrap_or_default(),
        },
    };

    state
        .conversations
        .typing(payload.conversation_id, actor, started)
        .await?;
    Ok(())
}

async fn close(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
) -> GatewayResult<()> {
    let payload: ConversationPayload = decode(payload)?;
    require_conversation_access(state, client, payload.conversation_id).await?;

    state.conversations.close(payload.conversation_id).await?;
    Ok(())
}

async fn subscribe(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
) -> GatewayResult<()> {
    let payload: TopicPayload = decode(payload)?;
    require_topic_access(state, client, &payload.topic).await?;

    state.hub.subscribe(client, &payload.topic).await;
    let _ = client.send(Envelope::new(
        events::SUBSCRIBE,
        json!({ "topic": payload.topic }),
    ));
    Ok(())
}

async fn unsubscribe(
    state: &GatewayState,
    client: &Arc<Client>,
    payload: serde_json::Value,
) -> GatewayResult<()> {
    let payload: TopicPayload = decode(payload)?;

    state.hub.unsubscribe(client.id(), &payload.topic).await;
    let _ = client.send(Envelope::new(
        events::UNSUBSCRIBE,
        json!({ "topic": payload.topic }),
    ));
    Ok(())
}

/// Contacts may only touch their own conversations; agents need the
/// conversation's inbox inside their access scope.
async fn require_conversation_access(
    state: &GatewayState,
    client: &Arc<Client>,
    conversation_id: i64,
) -> GatewayResult<Conversation> {
    let conversation = state.conversations.get(conversation_id).await?;

    let allowed = match client.role() {
        ClientRole::Contact => client.contact_id() == Some(conversation.contact_id),
        ClientRole::Agent => {
            conversation.company_id == client.company_id()
                && client.can_access_inbox(conversation.inbox_id).await
        }
    };

    if allowed {
        Ok(conversation)
    } else {
        Err(GatewayError::access_denied(
            "no access to this conversation",
        ))
    }
}

/// Role-appropriate topics only: contacts get their own channel and their
/// own conversations; agents get their company channel, their personal
/// channel, and conversations in inboxes they can access.
async fn require_topic_access(
    state: &GatewayState,
    client: &Arc<Client>,
    topic_name: &str,
) -> GatewayResult<()> {
    let Some((kind, id)) = parse_topic(topic_name) else {
        return Err(GatewayError::access_denied("unrecognized topic"));
    };

    let allowed = match (kind, client.role()) {
        ("contact", ClientRole::Contact) => client.contact_id() == Some(id),
        ("conversation", _) => {
            return require_conversation_access(state, client, id)
                .await
                .map(|_| ())
        }
        ("company", ClientRole::Agent) => client.company_id() == id,
        ("user", ClientRole::Agent) => client.user_id() == Some(id),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(GatewayError::access_denied("topic not allowed for role"))
    }
}

fn parse_topic(topic_name: &str) -> Option<(&str, i64)> {
    let (kind, id) = topic_name.split_once(':')?;
    Some((kind, id.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connect_agent, connect_contact, memory_state};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next_event(
        rx: &mut tokio::sync::mpsc::Receiver<Envelope>,
        event: &str,
    ) -> Envelope {
        timeout(Duration::from_secs(2), async {
            loop {
                let frame = rx.recv().await.expect("channel open");
                if frame.event == event {
                    return frame;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {event}"))
    }

    #[tokio::test]
    async fn contact_starts_conversation_and_gets_subscribed() {
        let backend = memory_state().await;
        let (client, mut rx) = connect_contact(&backend, None).await;

        handle_frame(
            &backend.state,
            &client,
            Envelope::new(
                events::CONVERSATION_START,
                json!({ "message": "hello?" }),
            ),
        )
        .await
        .unwrap();

        let frame = next_event(&mut rx, events::CONVERSATION_STARTED).await;
        let conversation_id = frame.payload["conversation"]["id"].as_i64().unwrap();
        assert!(
            backend
                .state
                .hub
                .topics()
                .is_subscribed(client.id(), &topic::conversation(conversation_id))
                .await
        );
    }

    #[tokio::test]
    async fn agent_cannot_start_a_conversation() {
        let backend = memory_state().await;
        let (agent, _rx) = connect_agent(&backend).await;

        let err = handle_frame(
            &backend.state,
            &agent,
            Envelope::new(events::CONVERSATION_START, json!({})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn messages_fan_out_to_conversation_subscribers() {
        let backend = memory_state().await;
        let (contact, mut contact_rx) = connect_contact(&backend, None).await;
        let (agent, mut agent_rx) = connect_agent(&backend).await;

        handle_frame(
            &backend.state,
            &contact,
            Envelope::new(events::CONVERSATION_START, json!({})),
        )
        .await
        .unwrap();
        let started = next_event(&mut contact_rx, events::CONVERSATION_STARTED).await;
        let conversation_id = started.payload["conversation"]["id"].as_i64().unwrap();

        // Agent joins the conversation channel, then the contact writes.
        handle_frame(
            &backend.state,
            &agent,
            Envelope::new(
                events::SUBSCRIBE,
                json!({ "topic": format!("conversation:{conversation_id}") }),
            ),
        )
        .await
        .unwrap();

        handle_frame(
            &backend.state,
            &contact,
            Envelope::new(
                events::CONVERSATION_SEND_MESSAGE,
                json!({ "conversation_id": conversation_id, "content": "anyone home?" }),
            ),
        )
        .await
        .unwrap();

        let frame = next_event(&mut agent_rx, events::MESSAGE_CREATED).await;
        assert_eq!(frame.payload["message"]["content"], "anyone home?");
        let echo = next_event(&mut contact_rx, events::MESSAGE_CREATED).await;
        assert_eq!(echo.payload["message"]["content"], "anyone home?");
    }

    #[tokio::test]
    async fn sending_into_a_closed_conversation_returns_typed_error() {
        let backend = memory_state().await;
        let (contact, mut contact_rx) = connect_contact(&backend, None).await;
        let (agent, _agent_rx) = connect_agent(&backend).await;

        handle_frame(
            &backend.state,
            &contact,
            Envelope::new(events::CONVERSATION_START, json!({})),
        )
        .await
        .unwrap();
        let started = next_event(&mut contact_rx, events::CONVERSATION_STARTED).await;
        let conversation_id = started.payload["conversation"]["id"].as_i64().unwrap();

        handle_frame(
            &backend.state,
            &agent,
            Envelope::new(
                events::CONVERSATION_CLOSE,
                json!({ "conversation_id": conversation_id }),
            ),
        )
        .await
        .unwrap();

        let err = handle_frame(
            &backend.state,
            &contact,
            Envelope::new(
                events::CONVERSATION_SEND_MESSAGE,
                json!({ "conversation_id": conversation_id, "content": "still there?" }),
            ),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "conversation_closed");
    }

    #[tokio::test]
    async fn contacts_cannot_subscribe_to_company_topics() {
        let backend = memory_state().await;
        let (contact, _rx) = connect_contact(&backend, None).await;

        let err = handle_frame(
            &backend.state,
            &contact,
            Envelope::new(events::SUBSCRIBE, json!({ "topic": "company:1" })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn contacts_cannot_touch_foreign_conversations() {
        let backend = memory_state().await;
        let (first, mut first_rx) = connect_contact(&backend, None).await;
        let (second, _second_rx) = connect_contact(&backend, None).await;

        handle_frame(
            &backend.state,
            &first,
            Envelope::new(events::CONVERSATION_START, json!({})),
        )
        .await
        .unwrap();
        let started = next_event(&mut first_rx, events::CONVERSATION_STARTED).await;
        let conversation_id = started.payload["conversation"]["id"].as_i64().unwrap();

        let err = handle_frame(
            &backend.state,
            &second,
            Envelope::new(
                events::CONVERSATION_SEND_MESSAGE,
                json!({ "conversation_id": conversation_id, "content": "intruder" }),
            ),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn unknown_event_is_rejected_not_fatal() {
        let backend = memory_state().await;
        let (contact, _rx) = connect_contact(&backend, None).await;

        let err = handle_frame(
            &backend.state,
            &contact,
            Envelope::new("warp_drive_engage", json!({})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "unknown_event");
    }
}

//! Event dispatch
//!
//! One exhaustive match from client intent to hub/relay operation. Every
//! precondition failure is reported back to the initiating connection as a
//! tagged `error` event; other connections never see another session's
//! errors.

use std::sync::Arc;

use crate::hub::Hub;
use crate::protocol::{ClientEvent, ErrorKind, ServerEvent};
use crate::relay::{chat, signaling};
use crate::session::SessionState;
use crate::store::MessageStore;

/// What the connection loop should do after a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading
    Continue,
    /// Close the connection (explicit logout)
    Close,
}

/// Dispatch one client event against the hub
pub async fn dispatch(
    event: ClientEvent,
    session: &mut SessionState,
    hub: &Hub,
    store: &Arc<dyn MessageStore>,
) -> Flow {
    let conn = session.conn_id;

    match event {
        ClientEvent::Login { user_id } => {
            session.identify(user_id.clone());
            hub.login(conn, &user_id).await;
        }

        ClientEvent::Logout { user_id } => {
            hub.logout(conn, &user_id).await;
            session.close();
            return Flow::Close;
        }

        ClientEvent::IsUserOnline { user_id } => {
            let online = hub.is_online(&user_id).await;
            hub.send_to(conn, ServerEvent::IsUserOnline { user_id, online })
                .await;
        }

        ClientEvent::ResolveConnectionId { user_id } => {
            let connection_id = hub.resolve_connection(&user_id).await;
            hub.send_to(
                conn,
                ServerEvent::ResolveConnectionId {
                    user_id,
                    connection_id,
                },
            )
            .await;
        }

        ClientEvent::CreateOrJoinGroupRoom {
            group_id,
            member_id,
        } => {
            hub.join_group(conn, &group_id, &member_id).await;
        }

        ClientEvent::LeaveGroupRoom { group_id } => {
            hub.leave_group(conn, &group_id).await;
        }

        ClientEvent::SendPersonalMessage {
            target_user_id,
            message,
        } => {
            // Sender identity comes from the session, never the payload
            let Some(sender_id) = session.user_id.clone() else {
                hub.send_to(
                    conn,
                    ServerEvent::error(
                        ErrorKind::InvalidState,
                        "Login required before sending personal messages",
                    ),
                )
                .await;
                return Flow::Continue;
            };
            let _persist =
                chat::relay_personal(hub, store.clone(), &sender_id, &target_user_id, &message)
                    .await;
        }

        ClientEvent::SendGroupMessage {
            group_id,
            message,
            sender_identity,
        } => {
            let _persist = chat::relay_group(
                hub,
                store.clone(),
                conn,
                &group_id,
                &sender_identity,
                &message,
            )
            .await;
        }

        ClientEvent::CreateLivestreamRoom { room_id } => {
            hub.create_live_room(conn, &room_id).await;
        }

        ClientEvent::JoinLivestreamRoom { room_id } => {
            if let Err(err) = hub.join_live_room(conn, &room_id).await {
                hub.send_to(conn, ServerEvent::error(err.kind(), err.to_string()))
                    .await;
            }
        }

        ClientEvent::HostSignal {
            room_id,
            signal_data,
        } => {
            if let Err(err) = hub.host_signal(conn, &room_id, signal_data).await {
                hub.send_to(conn, ServerEvent::error(err.kind(), err.to_string()))
                    .await;
            }
        }

        ClientEvent::ViewerSignal { room_id, signal } => {
            if let Err(err) = hub.viewer_signal(conn, &room_id, signal).await {
                hub.send_to(conn, ServerEvent::error(err.kind(), err.to_string()))
                    .await;
            }
        }

        ClientEvent::EndLivestream { room_id } => {
            if let Err(err) = hub.end_livestream(conn, &room_id).await {
                hub.send_to(conn, ServerEvent::error(err.kind(), err.to_string()))
                    .await;
            }
        }

        ClientEvent::InitiateCall {
            target_id,
            signal_data,
            sender_id,
            sender_name,
        } => {
            signaling::initiate(hub, conn, target_id, signal_data, sender_id, sender_name).await;
        }

        ClientEvent::AnswerCall {
            target_id,
            signal_data,
            media_type,
            media_status,
        } => {
            signaling::answer(hub, conn, target_id, signal_data, media_type, media_status).await;
        }

        ClientEvent::TerminateCall { target_id } => {
            signaling::terminate(hub, conn, target_id).await;
        }

        ClientEvent::SendMessage {
            target_id,
            message,
            sender_name,
        } => {
            signaling::call_message(hub, conn, target_id, message, sender_name).await;
        }

        ClientEvent::ChangeMediaStatus {
            media_type,
            is_active,
        } => {
            signaling::media_status(hub, conn, media_type, is_active).await;
        }
    }

    Flow::Continue
}

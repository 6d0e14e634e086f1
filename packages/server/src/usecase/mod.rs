//! UseCase layer: one struct per operation, depending only on domain interfaces.

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_rooms;
pub mod issue_relay_credentials;
pub mod join_room;
pub mod kick_participant;
pub mod presence;
pub mod record_ping;
pub mod send_signal;
pub mod session_handler;
pub mod update_state;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{KickError, RelayCredentialsError, SignalError};
pub use get_rooms::GetRoomsUseCase;
pub use issue_relay_credentials::IssueRelayCredentialsUseCase;
pub use join_room::JoinRoomUseCase;
pub use kick_participant::KickParticipantUseCase;
pub use presence::PresenceBroadcaster;
pub use record_ping::RecordPingUseCase;
pub use send_signal::SendSignalUseCase;
pub use session_handler::{ConnectionState, FrameVerdict, ProtocolUseCases, SessionHandler};
pub use update_state::UpdateStateUseCase;

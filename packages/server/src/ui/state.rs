//! Shared application state.

use std::sync::Arc;

use yoriai_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, RatePolicy, RoomRepository},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRoomsUseCase,
        IssueRelayCredentialsUseCase, ProtocolUseCases,
    },
};

use super::middleware::ApiRateLimiter;

pub struct AppState {
    pub config: ServerConfig,
    /// ConnectParticipantUseCase（接続開始のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// 受信メッセージから呼ばれるユースケース一式
    pub protocol_usecases: Arc<ProtocolUseCases>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// IssueRelayCredentialsUseCase（TURN 認証情報発行のユースケース）
    pub issue_relay_credentials_usecase: Arc<IssueRelayCredentialsUseCase>,
    pub api_rate_limiter: ApiRateLimiter,
}

impl AppState {
    /// Wire every use case onto one repository and one message pusher.
    pub fn new(
        config: ServerConfig,
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            protocol_usecases: Arc::new(ProtocolUseCases::new(
                repository.clone(),
                message_pusher,
                clock.clone(),
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository)),
            issue_relay_credentials_usecase: Arc::new(IssueRelayCredentialsUseCase::new(
                config.relay.clone(),
                clock.clone(),
            )),
            api_rate_limiter: ApiRateLimiter::new(RatePolicy::HTTP_API, clock),
            config,
        }
    }
}

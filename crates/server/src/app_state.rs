use crate::chatroom::Chatroom;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) room: Chatroom,
}

pub mod attendance;
pub mod shift;
pub mod team_member;

//! Shared helpers for the integration tests.

#![allow(dead_code)]

use wayfarer::{
    Action, Chunk, ChunkRequest, Enemy, EnemyKind, Position, Request, RulesConfig, Session,
    TurnReport, WayfarerResult,
};

/// Returns the first chunk request in a report.
pub fn chunk_request(report: &TurnReport) -> Option<&ChunkRequest> {
    report.requests.iter().find_map(|request| match request {
        Request::GenerateChunk(request) => Some(request),
        _ => None,
    })
}

/// Boots a deterministic session and starts a warrior game on `chunk`.
pub fn playing_session(chunk: Chunk) -> WayfarerResult<Session> {
    let mut session = Session::new(RulesConfig::for_testing(), 7)?;
    session.tick(session.rules.boot_delay_ms);
    session.handle_input(Action::Start)?;
    let report = session.handle_input(Action::Start)?;
    let ticket = chunk_request(&report)
        .map(|request| request.ticket)
        .expect("new game should request the origin chunk");
    session.complete_chunk_load(ticket, Ok(chunk))?;
    Ok(session)
}

/// An open 20x15 chunk.
pub fn open_chunk() -> Chunk {
    Chunk::new(20, 15, "Test")
}

pub fn slime(x: i32, y: i32, hp: i32) -> Enemy {
    Enemy {
        id: format!("e_0_0_{x}_{y}"),
        kind: EnemyKind::Slime,
        spawn_index: 0,
        position: Position::new(x, y),
        hp,
        max_hp: hp,
        name: "Slime".to_string(),
        is_elite: false,
        flash: None,
    }
}

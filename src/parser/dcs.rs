//! DCS classifier. The only recognized device control string is DECRQSS
//! (`DCS $ q Pt ST`); everything else is discarded.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DcsCommand {
    /// DECRQSS: request the current value of a settable feature. The
    /// payload is the raw `Pt` selector (e.g. `m`, `r`, `" q"`).
    RequestStatus(String),
    Unrecognized,
}

pub fn classify(intermediates: &[u8], final_byte: u8, data: &[u8]) -> DcsCommand {
    match (intermediates, final_byte) {
        ([b'$'], b'q') => DcsCommand::RequestStatus(String::from_utf8_lossy(data).into_owned()),
        _ => DcsCommand::Unrecognized,
    }
}

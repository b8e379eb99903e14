//! Final container layout (§4.3 step 7) and the post-link abort check
//! (§4.3 step 10).

use alloc::vec::Vec;

use crate::container::pef::{PefCommandHeader, PefContainer};

/// Walks the command table in order, shifting every `offset` by a
/// running file offset that starts at `commands.len() * sizeof(header) +
/// 16` padding bytes. When the `__ImageStart` + `.code64` header is
/// reached, its post-shift offset is captured so the caller can patch
/// `PefContainer::start` — the original source does this by seeking back
/// to file offset 0 and rewriting the container in place; building the
/// container in memory first means we can just assign the field.
pub fn layout(container: &mut PefContainer, commands: &mut [PefCommandHeader]) {
    let header_size = core::mem::size_of::<PefCommandHeader>() as u64;
    let mut running = commands.len() as u64 * header_size + 16;
    for command in commands.iter_mut() {
        let is_entrypoint = command.is_code_entrypoint();
        command.offset += running;
        command.virtual_address = command.offset;
        running += command.offset_size.max(command.virtual_size);
        if is_entrypoint {
            container.start = command.offset;
        }
    }
}

/// The documented post-check (§4.3 step 10, §9 Open Question ii),
/// resolved with standard `&&`-binds-tighter-than-`||` precedence:
/// `!start_found || (duplicates_found && output_exists) || !unresolved.is_empty()`.
pub fn should_abort(start_found: bool, duplicates_found: bool, output_exists: bool, unresolved_remaining: usize) -> bool {
    !start_found || (duplicates_found && output_exists) || unresolved_remaining != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::pef::PefKind;

    #[test]
    fn entrypoint_offset_is_copied_into_container_start() {
        let mut container = PefContainer::new_thin(101, 200, 1);
        let mut commands: Vec<PefCommandHeader> = Vec::new();
        let mut other = PefCommandHeader::default();
        other.set_name("data.data64");
        other.offset_size = 8;
        let mut entry = PefCommandHeader::default();
        entry.set_name("__ImageStart.code64");
        entry.kind = PefKind::Code as u16;
        entry.offset_size = 4;
        commands.push(other);
        commands.push(entry);

        layout(&mut container, &mut commands);

        assert_eq!(container.start, commands[1].offset);
        assert!(commands[1].offset > commands[0].offset);
    }

    #[test]
    fn post_check_precedence_matches_documented_reading() {
        assert!(should_abort(false, false, false, 0));
        assert!(!should_abort(true, true, false, 0));
        assert!(should_abort(true, true, true, 0));
        assert!(should_abort(true, false, false, 1));
    }
}

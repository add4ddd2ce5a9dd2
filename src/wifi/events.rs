use super::types::StationEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HookKind {
    Connected,
    Disconnected,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct EventOutcome {
    pub(crate) link_up: Option<bool>,
    pub(crate) hook: Option<HookKind>,
}

// "Connected" here means a usable IP, not mere association: only GotIp
// raises the flag, while any of the three down events lowers it and
// reports through the same disconnection hook.
pub(crate) fn fold_station_event(event: StationEvent) -> EventOutcome {
    match event {
        StationEvent::Started | StationEvent::Connected | StationEvent::AuthModeChanged => {
            EventOutcome::default()
        }
        StationEvent::GotIp => EventOutcome {
            link_up: Some(true),
            hook: Some(HookKind::Connected),
        },
        StationEvent::LostIp | StationEvent::Disconnected | StationEvent::Stopped => EventOutcome {
            link_up: Some(false),
            hook: Some(HookKind::Disconnected),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_events_change_nothing() {
        for event in [
            StationEvent::Started,
            StationEvent::Connected,
            StationEvent::AuthModeChanged,
        ] {
            assert_eq!(fold_station_event(event), EventOutcome::default());
        }
    }

    #[test]
    fn got_ip_raises_link_and_fires_connected() {
        let outcome = fold_station_event(StationEvent::GotIp);
        assert_eq!(outcome.link_up, Some(true));
        assert_eq!(outcome.hook, Some(HookKind::Connected));
    }

    #[test]
    fn every_down_event_lowers_link_and_fires_disconnected() {
        for event in [
            StationEvent::LostIp,
            StationEvent::Disconnected,
            StationEvent::Stopped,
        ] {
            let outcome = fold_station_event(event);
            assert_eq!(outcome.link_up, Some(false));
            assert_eq!(outcome.hook, Some(HookKind::Disconnected));
        }
    }
}

use std::time::Duration;

use nix::sys::signal::Signal;
use proptest::prelude::*;
use watchy::engine::{CoreCommand, CoreRuntime, RuntimeEvent, TriggerReason};
use watchy::supervisor::{ExitOutcome, SupervisorState};
use watchy_test_utils::builders::PolicyBuilder;

#[derive(Debug, Clone)]
enum Op {
    Run,
    ChildExits(ExitOutcome),
    StaleExit,
    SpawnFails,
    TimerFires,
    Shutdown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Run),
        2 => Just(Op::ChildExits(ExitOutcome::Code(0))),
        1 => Just(Op::ChildExits(ExitOutcome::Code(2))),
        1 => Just(Op::ChildExits(ExitOutcome::Signal(Signal::SIGTERM as i32))),
        1 => Just(Op::ChildExits(ExitOutcome::Signal(Signal::SIGKILL as i32))),
        1 => Just(Op::StaleExit),
        1 => Just(Op::SpawnFails),
        1 => Just(Op::TimerFires),
        1 => Just(Op::Shutdown),
    ]
}

/// Models the outside world: which incarnation is alive right now.
#[derive(Default)]
struct World {
    live: Option<u64>,
    last_spawned: u64,
    exited: bool,
}

impl World {
    fn apply(&mut self, commands: Vec<CoreCommand>) -> Result<(), TestCaseError> {
        for command in commands {
            prop_assert!(!self.exited, "command after exit: {:?}", command);
            match command {
                CoreCommand::Spawn { incarnation, .. } => {
                    prop_assert!(self.live.is_none(), "spawned {} while {:?} alive", incarnation, self.live);
                    prop_assert!(incarnation > self.last_spawned);
                    self.live = Some(incarnation);
                    self.last_spawned = incarnation;
                }
                CoreCommand::Signal { incarnation, .. } | CoreCommand::Kill { incarnation } => {
                    prop_assert_eq!(self.live, Some(incarnation));
                }
                CoreCommand::Exit => {
                    prop_assert!(self.live.is_none(), "exit with a live child");
                    self.exited = true;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

proptest! {
    #[test]
    fn never_two_children_and_never_exit_with_a_live_child(
        keep_alive in any::<bool>(),
        restart_after_signal in any::<bool>(),
        reload in any::<bool>(),
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        let mut builder = PolicyBuilder::new()
            .keep_alive(keep_alive)
            .restart_after_signal(restart_after_signal)
            .kill_timeout(Duration::from_secs(1));
        if reload {
            builder = builder.reload_signal("SIGHUP");
        }
        let mut core = CoreRuntime::new(builder.build());
        let mut world = World::default();

        for op in ops {
            if world.exited {
                break;
            }
            let event = match op {
                Op::Run => RuntimeEvent::RunRequested { paths: vec!["a".into()], reason: TriggerReason::FileWatch },
                Op::ChildExits(exit) => match world.live.take() {
                    Some(incarnation) => RuntimeEvent::ChildExited { incarnation, exit },
                    None => continue,
                },
                Op::StaleExit => RuntimeEvent::ChildExited {
                    incarnation: world.last_spawned.saturating_sub(1),
                    exit: ExitOutcome::Code(0),
                },
                Op::SpawnFails => match world.live.take() {
                    Some(incarnation) => RuntimeEvent::SpawnFailed { incarnation, error: "boom".into() },
                    None => continue,
                },
                Op::TimerFires => RuntimeEvent::KillTimerElapsed { incarnation: world.last_spawned },
                Op::Shutdown => RuntimeEvent::ShutdownRequested,
            };

            let step = core.step(event);
            world.apply(step.commands)?;
            prop_assert_eq!(step.keep_running, !world.exited);
            prop_assert_eq!(core.state().has_child(), world.live.is_some());
        }

        if world.exited {
            prop_assert_eq!(core.state(), SupervisorState::Dead);
        }
    }
}

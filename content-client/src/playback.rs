//! Координация воспроизведения: одновременно играет не больше одного аудио.
//!
//! Координатор передаётся карточкам явно (как общий сервис), а не живёт в
//! глобальной переменной модуля.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Аудиоэлемент, которым управляет координатор.
///
/// Реализации могут синхронно вызывать `notify_paused`/`notify_ended`
/// из своих методов: координатор не держит блокировку во время вызовов.
pub trait AudioElement: Send + Sync {
    /// Начать воспроизведение.
    fn play(&self);
    /// Поставить на паузу.
    fn pause(&self);
    /// Перемотать в начало.
    fn rewind(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Идентификатор сессии воспроизведения одной карточки.
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio#{}", self.0)
    }
}

struct ActiveSession {
    handle: HandleId,
    element: Arc<dyn AudioElement>,
}

#[derive(Default)]
struct CoordinatorState {
    next_id: u64,
    // Растёт на каждом `request_play` и `stop`.
    generation: u64,
    active: Option<ActiveSession>,
}

#[derive(Clone, Default)]
/// Общий сервис, который следит, чтобы играл только один аудиоэлемент.
pub struct PlaybackCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
}

impl fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("active", &self.active())
            .finish()
    }
}

impl PlaybackCoordinator {
    /// Создаёт координатор без активной сессии.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Выдаёт новый идентификатор для карточки с аудио.
    pub fn register(&self) -> HandleId {
        let mut state = self.lock();
        state.next_id += 1;
        HandleId(state.next_id)
    }

    /// Текущая играющая сессия.
    pub fn active(&self) -> Option<HandleId> {
        self.lock().active.as_ref().map(|session| session.handle)
    }

    /// Играет ли сейчас указанная сессия.
    pub fn is_playing(&self, handle: HandleId) -> bool {
        self.active() == Some(handle)
    }

    /// Запускает `element` и останавливает предыдущую сессию.
    ///
    /// Вытесненный элемент ставится на паузу и перематывается в начало.
    /// Если пока шёл `play()` координатор успел переключиться на другую
    /// сессию (или получил `stop`), элемент сразу останавливается снова.
    pub fn request_play(&self, handle: HandleId, element: Arc<dyn AudioElement>) {
        let (previous, generation) = {
            let mut state = self.lock();
            state.generation += 1;
            let previous = state.active.replace(ActiveSession {
                handle,
                element: Arc::clone(&element),
            });
            (previous, state.generation)
        };

        if let Some(previous) = previous.filter(|session| session.handle != handle) {
            debug!(preempted = %previous.handle, active = %handle, "stopping previous audio");
            previous.element.pause();
            previous.element.rewind();
        }
        element.play();

        let superseded_by = {
            let state = self.lock();
            if state.generation == generation {
                return;
            }
            state.active.as_ref().map(|session| session.handle)
        };
        match superseded_by {
            Some(active) if active == handle => {}
            Some(active) => {
                debug!(preempted = %handle, %active, "audio superseded while starting");
                element.pause();
                element.rewind();
            }
            None => element.pause(),
        }
    }

    /// Элемент сообщил о паузе.
    pub fn notify_paused(&self, handle: HandleId) {
        self.clear_if_active(handle);
    }

    /// Элемент доиграл до конца.
    pub fn notify_ended(&self, handle: HandleId) {
        self.clear_if_active(handle);
    }

    /// Карточка размонтирована: её сессия больше не может быть активной.
    pub fn unregister(&self, handle: HandleId) {
        self.clear_if_active(handle);
    }

    /// Ставит на паузу текущую сессию, например при смене страницы.
    pub fn stop(&self) {
        let previous = {
            let mut state = self.lock();
            state.generation += 1;
            state.active.take()
        };
        if let Some(previous) = previous {
            previous.element.pause();
        }
    }

    fn clear_if_active(&self, handle: HandleId) {
        let mut state = self.lock();
        if state
            .active
            .as_ref()
            .is_some_and(|session| session.handle == handle)
        {
            state.active = None;
        }
    }
}

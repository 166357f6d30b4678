//! Container bindings
//!
//! - static: контейнер уже есть → enumerate children (каждый bind отдельным
//!   deferred job) + подписка на будущие children
//! - deferred: контейнера может ещё не быть → single-shot ожидание, потом static
//!
//! Удаление не поллится: единственный сигнал удаления - `destroying`
//! самого объекта (см. `destroy_on_destroying`).

use std::cell::RefCell;
use std::rc::Rc;

use super::{Tracker, TrackingContext};
use crate::cleanup::{ResourceBin, SharedBin};
use crate::host::{Connection, InstanceRef};
use crate::logger;

/// Bind одного child. Ошибка логируется и не трогает соседей.
///
/// Уже отслеживаемый child пропускается: deferred job для existing child
/// и `child_added` того же объекта (reparent до resume) сходятся сюда.
fn bind_child<T: Tracker>(child: &InstanceRef, ctx: &TrackingContext) {
    if child.is_destroyed() || T::registry(&ctx.trackers).contains(child.id()) {
        return;
    }

    if let Err(err) = T::bind(child, ctx) {
        logger::log_warning(&format!(
            "❌ {} bind failed for {:?} ({}): {}",
            T::KIND,
            child.id(),
            child.name(),
            err
        ));
    }
}

pub fn bind_container<T: Tracker + 'static>(
    container: &InstanceRef,
    ctx: &TrackingContext,
    bin: &mut ResourceBin,
) {
    for child in container.children() {
        let job_ctx = ctx.clone();
        bin.add(ctx.scheduler.defer(move || bind_child::<T>(&child, &job_ctx)));
    }

    let signal_ctx = ctx.clone();
    bin.add(
        container
            .child_added
            .connect(move |child| bind_child::<T>(child, &signal_ctx)),
    );

    logger::log(&format!(
        "🔗 Bound {} container {:?} ({})",
        T::KIND,
        container.id(),
        container.name()
    ));
}

/// Single-shot: `on_ready` вызывается ровно один раз - сразу, если child
/// уже есть, иначе при первом `child_added` с этим именем. Возвращает
/// connection только если пришлось ждать.
pub fn wait_for_child(
    parent: &InstanceRef,
    name: &str,
    on_ready: impl FnOnce(&InstanceRef) + 'static,
) -> Option<Connection> {
    if let Some(child) = parent.find_first_child(name) {
        on_ready(&child);
        return None;
    }

    let pending: RefCell<Option<Box<dyn FnOnce(&InstanceRef)>>> =
        RefCell::new(Some(Box::new(on_ready)));
    let own_connection: Rc<RefCell<Option<Connection>>> = Rc::new(RefCell::new(None));

    let expected = name.to_string();
    let slot = own_connection.clone();
    let connection = parent.child_added.connect(move |child| {
        if child.name() != expected {
            return;
        }
        let ready = pending.borrow_mut().take();
        if let Some(ready) = ready {
            if let Some(connection) = slot.borrow_mut().take() {
                connection.disconnect();
            }
            ready(child);
        }
    });

    *own_connection.borrow_mut() = Some(connection.clone());
    Some(connection)
}

pub fn bind_deferred_container<T: Tracker + 'static>(
    parent: &InstanceRef,
    name: &str,
    ctx: &TrackingContext,
    bin: &SharedBin,
) {
    let ready_ctx = ctx.clone();
    let ready_bin = bin.clone();
    let waiting = wait_for_child(parent, name, move |container| {
        logger::log_info(&format!(
            "📦 {} container `{}` is available",
            T::KIND,
            container.name()
        ));
        bind_container::<T>(container, &ready_ctx, &mut ready_bin.borrow_mut());
    });

    if let Some(connection) = waiting {
        logger::log(&format!(
            "⏳ Waiting for {} container `{}` under {}",
            T::KIND,
            name,
            parent.name()
        ));
        bin.borrow_mut().add(connection);
    }
}

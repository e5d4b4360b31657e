//! Screen switcher showing one registered view at a time.

use crate::error::{GhdError, Result};
use crate::signal::{merge_results, AsyncSignal};
use crate::widget::core::{Widget, WidgetCore, WidgetRef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

pub struct MultiView<K> {
    core: WidgetCore,
    views: HashMap<K, WidgetRef>,
    current: Option<K>,
    view_switched: AsyncSignal<K, Result<()>>,
}

impl<K> MultiView<K>
where
    K: Eq + Hash + Clone + Debug + 'static,
{
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            core: WidgetCore::vertical(),
            views: HashMap::new(),
            current: None,
            view_switched: AsyncSignal::new(),
        }))
    }

    /// Register `view` under `key`. The view is parented here but stays hidden
    /// until shown.
    pub fn add(this: &Rc<RefCell<Self>>, key: K, view: WidgetRef) {
        let host: WidgetRef = this.clone();
        let console = this.borrow().core.console().cloned();
        {
            let mut widget = view.borrow_mut();
            let core = widget.core_mut();
            core.set_parent(Some(Rc::downgrade(&host)));
            core.set_console(console);
        }
        this.borrow_mut().views.insert(key, view);
    }

    pub fn view(&self, key: &K) -> Option<WidgetRef> {
        self.views.get(key).cloned()
    }

    /// Key of the view on screen, `None` before the first [`show`](Self::show).
    pub fn current(&self) -> Option<&K> {
        self.current.as_ref()
    }

    pub fn view_switched(&self) -> &AsyncSignal<K, Result<()>> {
        &self.view_switched
    }

    /// Make `key` the active view, lay it out and announce the switch.
    pub async fn show(this: &Rc<RefCell<Self>>, key: K) -> Result<()> {
        let view_switched = {
            let mut multiview = this.borrow_mut();
            let view = multiview
                .views
                .get(&key)
                .cloned()
                .ok_or_else(|| GhdError::unknown_view(&key))?;

            let core = &mut multiview.core;
            core.replace_children(vec![view]);
            core.layout_children(core.width(), core.height());
            if let Some(console) = core.console() {
                console.request_redraw();
            }
            multiview.current = Some(key.clone());
            multiview.view_switched.clone()
        };

        log::debug!("showing view {key:?}");
        merge_results(view_switched.emit(key).await)
    }
}

impl<K: 'static> Widget for MultiView<K> {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }
}

//! Route/view binder component.
//!
//! Maps the current navigation path to the active-tab indicator and the view
//! that receives the session. Purely derived: the URL hash is the source of
//! truth and the binder holds no independent state.

use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::Closure;

use crate::app::AppContext;
use crate::components::navbar::NavBar;
use crate::components::views::{
    ConnectWalletNotice, ErrorView, FractionaliseView, HomeView, ListNftView, ListingDetailView,
    MintView, ProfileView,
};
use crate::models::{AppRoute, ViewKind, active_tab, view_for};

/// Main route/view binder.
///
/// Routes:
/// - `#/` → Home
/// - `#/mint` → Mint
/// - `#/list` → Create a listing
/// - `#/fractionalise` → Fractionalise (wallet-guarded)
/// - `#/profile/:address` → Profile
/// - `#/listing/:id` → Listing detail
/// - anything else → Error view
#[component]
pub fn RouteViewBinder() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let route = RwSignal::new(AppRoute::current());

    // hashchange keeps the route signal in sync with the URL, so browser
    // back/forward work without any router state of our own
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        let closure = Closure::wrap(Box::new(move || {
            route.set(AppRoute::current());
        }) as Box<dyn Fn()>);
        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref());
        }
        closure.forget();
    }

    let session = ctx.session;
    // View selection is a pure function of (route, wallet state): the
    // guarded route swaps atomically with the wallet transition, with no
    // intermediate stale render.
    let view_kind = Memo::new_local(move |_| view_for(&route.get(), &session.get().wallet));
    let active = Memo::new(move |_| active_tab(&route.get().to_path()));

    view! {
        <NavBar active=active />
        <main class="content">
            {move || match view_kind.get() {
                ViewKind::Home => view! { <HomeView session=session /> }.into_any(),
                ViewKind::Mint => view! { <MintView session=session /> }.into_any(),
                ViewKind::ListNft => view! { <ListNftView session=session /> }.into_any(),
                ViewKind::Fractionalise => {
                    view! { <FractionaliseView session=session /> }.into_any()
                }
                ViewKind::ConnectWallet => view! { <ConnectWalletNotice /> }.into_any(),
                ViewKind::Profile { address } => {
                    view! { <ProfileView session=session address=address /> }.into_any()
                }
                ViewKind::Listing { id } => {
                    view! { <ListingDetailView session=session id=id /> }.into_any()
                }
                ViewKind::Error => view! { <ErrorView /> }.into_any(),
            }}
        </main>
    }
}

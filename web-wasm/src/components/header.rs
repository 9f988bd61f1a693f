//! ヘッダーコンポーネント

use leptos::prelude::*;

#[component]
pub fn Header() -> impl IntoView {
    view! {
        <header class="header">
            <h1>"Substation Intake - 点検写真・試験成績書"</h1>
        </header>
    }
}

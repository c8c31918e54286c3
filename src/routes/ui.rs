use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Document Search Console</title>
  <link rel="stylesheet" href="/assets/console.css" onerror="this.remove()" />
  <style>
    body { font-family: Arial, sans-serif; margin: 0; color: #1d1d1f; display: flex; min-height: 100vh; }
    aside { width: 320px; padding: 1.5rem; background: #f4f5f7; border-right: 1px solid #ddd; }
    main { flex: 1; padding: 1.5rem 2rem; }
    h1 { margin: 0 0 0.25rem 0; font-size: 1.4rem; }
    h2 { font-size: 1.05rem; margin: 1.5rem 0 0.5rem 0; }
    label { display: block; margin-top: 0.75rem; font-weight: 600; }
    input, select, textarea { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    button { margin-top: 0.75rem; padding: 0.5rem 0.9rem; cursor: pointer; }
    .tenant { display: block; width: 100%; text-align: left; }
    .tenant.active { background: #2d6cdf; color: #fff; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    .meta { color: #666; font-size: 0.85rem; }
    .badge { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 4px; background: #e8eefc; font-size: 0.8rem; text-transform: uppercase; }
    .notice { padding: 0.75rem 1rem; border-radius: 6px; margin-bottom: 1rem; }
    .notice.success { background: #e3f6e8; }
    .notice.info { background: #e8eefc; }
    .notice.warning { background: #fff4d6; }
    .notice.error { background: #fde2e2; }
    pre { background: #f6f8fa; padding: 1rem; overflow: auto; white-space: pre-wrap; }
    .hidden { display: none; }
  </style>
</head>
<body>
  <aside>
    <h1>Document Search</h1>
    <p class="meta">Search and AI-powered discovery across department documents.</p>

    <h2>Departments</h2>
    <div id="tenants" class="meta">Loading...</div>

    <h2>Search</h2>
    <label for="searchType">Search type</label>
    <select id="searchType">
      <option value="hybrid">Hybrid</option>
      <option value="keyword">Keyword</option>
      <option value="vector">Vector</option>
      <option value="generative">Generative</option>
    </select>
    <div id="alphaRow">
      <label for="alpha">Blend weight (alpha): <span id="alphaValue">0.5</span></label>
      <input id="alpha" type="range" min="0" max="1" step="0.1" value="0.5" />
    </div>
    <label for="query">Query</label>
    <input id="query" placeholder="e.g. remote work policy" />
    <button id="searchBtn">Search</button>
    <button id="clearBtn">Clear search</button>

    <h2>AI Agent</h2>
    <label for="agentQuery">Ask a question</label>
    <textarea id="agentQuery" rows="3" placeholder="e.g. How many vacation days do employees get?"></textarea>
    <button id="agentBtn">Ask agent</button>
  </aside>

  <main>
    <div id="notice"></div>
    <div id="content"><p class="meta">Select a department to begin.</p></div>
  </main>

  <script>
    let view = {};
    const $ = (id) => document.getElementById(id);
    const esc = (s) => String(s ?? '').replace(/[&<>"']/g, (c) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));

    async function act(action) {
      const res = await fetch('/api/view', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ state: view, action })
      });
      const json = await res.json();
      if (json.state) {
        view = json.state;
      } else {
        view.notice = { level: 'error', message: json.details || 'Request failed' };
      }
      render();
    }

    async function loadTenants() {
      const res = await fetch('/api/tenants');
      const box = $('tenants');
      if (!res.ok) {
        box.textContent = 'Unable to fetch tenants. Please check your API connection.';
        return;
      }
      const tenants = await res.json();
      box.innerHTML = '';
      for (const t of tenants) {
        const btn = document.createElement('button');
        btn.className = 'tenant';
        btn.dataset.name = t.name;
        btn.textContent = `${t.name} (${t.document_count} docs)`;
        btn.addEventListener('click', () => act({ type: 'select_tenant', tenant: t.name }));
        box.appendChild(btn);
      }
    }

    function docCard(doc, full) {
      const score = doc.score != null ? ` | score ${Number(doc.score).toFixed(3)}` : '';
      const body = full ? doc.content : String(doc.content).slice(0, 400) + (doc.content.length > 400 ? '...' : '');
      return `<div class="card"><strong>${esc(doc.file_name)}</strong>
        <div class="meta">${esc(doc.created_date)} | chunk ${doc.chunk_index}${score}</div>
        <p>${esc(body)}</p></div>`;
    }

    function renderSearch(results) {
      const generated = results.search_type === 'generative';
      return `<h2>Results for "${esc(results.query)}" <span class="badge">${esc(results.search_type)}</span></h2>
        <p class="meta">${results.total_count} document(s)${results.fallback ? ' (fallback)' : ''}</p>
        ${results.documents.map((d) => docCard(d, generated)).join('')}`;
    }

    function renderAgent(resp) {
      const sources = (resp.source_documents || []).map((d) => docCard(d, false)).join('');
      return `<h2>Agent answer</h2>
        <pre>${esc(resp.pretty_blocks.join(''))}</pre>
        <pre>${esc(resp.usage_block)}</pre>
        <h2>Source documents</h2>${sources || '<p class="meta">No source documents.</p>'}`;
    }

    function renderDocuments() {
      const tenant = view.selected_tenant;
      let html = `<h2>${esc(tenant)} documents</h2>
        <button onclick="act({ type: 'show_chunks', filter: $('docFilter') ? $('docFilter').value : null })">Chunks</button>
        <button onclick="act({ type: 'show_full_documents' })">All documents</button>`;
      if (view.document_view === 'chunks') {
        html += `<label for="docFilter">Filter</label><input id="docFilter" />`;
        if (view.chunk_caption) html += `<p class="meta">${esc(view.chunk_caption)}</p>`;
        html += view.documents.slice(0, view.visible_chunk_count).map((d) => docCard(d, false)).join('');
      } else if (view.document_view === 'full_documents') {
        html += view.full_documents.map((d, i) => {
          const open = (view.expanded_text || {})[i];
          return `<div class="card"><strong>${esc(d.file_name)}</strong>
            <button onclick="act({ type: 'toggle_expanded', index: ${i} })">${open != null ? 'Collapse' : 'Expand'}</button>
            ${open != null ? `<pre>${esc(open)}</pre>` : ''}</div>`;
        }).join('') || '<p class="meta">No documents found.</p>';
      } else {
        html += `<p class="meta">Choose either "Chunks" or "All documents" to view the ${esc(tenant)} documents.</p>`;
      }
      return html;
    }

    function render() {
      const n = view.notice;
      $('notice').innerHTML = n ? `<div class="notice ${esc(n.level)}">${esc(n.message)}</div>` : '';
      document.querySelectorAll('.tenant').forEach((b) => b.classList.toggle('active', b.dataset.name === view.selected_tenant));

      let html = '<p class="meta">Select a department to begin.</p>';
      if (view.current_view === 'search' && view.search_results) {
        html = renderSearch(view.search_results);
      } else if (view.current_view === 'agent' && view.agent_response) {
        html = renderAgent(view.agent_response);
      } else if (view.selected_tenant) {
        html = renderDocuments();
      }
      $('content').innerHTML = html;
    }

    $('searchType').addEventListener('change', () => {
      $('alphaRow').classList.toggle('hidden', $('searchType').value !== 'hybrid');
    });
    $('alpha').addEventListener('input', () => { $('alphaValue').textContent = $('alpha').value; });
    $('searchBtn').addEventListener('click', () => {
      const search_type = $('searchType').value;
      const action = { type: 'search', query: $('query').value, search_type };
      if (search_type === 'hybrid') action.alpha = parseFloat($('alpha').value);
      act(action);
    });
    $('clearBtn').addEventListener('click', () => act({ type: 'clear_search' }));
    $('agentBtn').addEventListener('click', () => act({ type: 'query_agent', query: $('agentQuery').value }));

    loadTenants();
  </script>
</body>
</html>"#)
}
